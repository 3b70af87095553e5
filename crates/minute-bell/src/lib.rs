pub mod cli;
pub mod clock;
pub mod config;
pub mod machine;
pub mod phase;
pub mod runtime;
pub mod sound;
pub mod view;
