//! These models represent the objects passed around by the agent loop.
//!
//! There are two related formats in play: the internal structs used by the
//! turn executor and stored in session transcripts, and the OpenAI-style
//! wire format sent to the model backend. The wire format is produced from
//! these structs in `providers::utils` and never flows past the provider.
pub mod message;
pub mod role;
pub mod tool;
