mod assembler;
mod engine;
mod error;
mod midi_importer;
mod model;
mod selector;
mod timeline;
mod util;

pub use assembler::*;
pub use engine::chords::*;
pub use engine::scheduler::*;
pub use engine::*;
pub use error::*;
pub use midi_importer::*;
pub use model::config::*;
pub use model::midi::*;
pub use model::mml::*;
pub use model::score::*;
pub use model::timeline::*;
pub use selector::*;
pub use timeline::*;
pub use util::*;
