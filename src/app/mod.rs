pub mod ports;
pub mod rebuild_use_case;
pub mod update_use_case;

mod sources;
