pub mod hosting;
pub mod providers;
pub mod publishing;
pub mod scheduler;
