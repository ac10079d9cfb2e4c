pub mod process;
pub mod system;
