pub mod wav;
pub mod window;

pub use window::ProbeWindow;
