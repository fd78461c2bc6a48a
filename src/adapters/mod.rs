pub mod criteria;
pub mod diagnostics;
pub mod plugin;
