pub mod resize;

pub use resize::{ResizeRequest, ResizeResult, ResizeStatus, Strategy};
