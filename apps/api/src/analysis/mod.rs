// Analysis: the gate between intake and generation.

pub mod gate;
pub mod prompts;
