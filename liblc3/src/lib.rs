pub use op::{Condition, Instruction, Opcode, Register, Source};
pub use word::{Word, WordExt};

pub mod op;
pub mod word;
