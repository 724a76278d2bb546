//! Block implementations.
//!
//! | Block        | Bus            | Purpose                              |
//! |--------------|----------------|--------------------------------------|
//! | `example`    | receive        | Reference block, copies config out   |
//! | `node_link`  | receive + send | DBC-style bridge to a motor node     |
//! | `scale`      | none           | `input * gain + offset`              |

pub mod example;
pub mod node_link;
pub mod scale;
