pub mod chooser;

pub use chooser::{MoveChooser, RandomMover, Strength};
