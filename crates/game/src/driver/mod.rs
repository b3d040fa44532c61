mod game_loop;
mod input;

pub use game_loop::{GameLoop, Renderer};
pub use input::{InputEvent, InputSource, SpawnRng};
