//! Attention-based sequence-to-sequence core on libtorch (via `tch`).
//!
//! Four collaborating pieces: an LSTM [`Encoder`], a temperature-softmax
//! [`Attention`] scorer, a single-step GRU [`Decoder`], and the [`Seq2Seq`]
//! orchestrator that drives autoregressive decoding with per-timestep
//! teacher forcing. Token tensors are time-major throughout: `[time, batch]`
//! in, `[time, batch, vocab]` scores out.
//!
//! Data loading, tokenization, training, and checkpointing are the caller's
//! job; this crate only maps token-index tensors to score tensors.

pub mod attention;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod seq2seq;

pub use attention::{softmax_temperature, Attention};
pub use config::Seq2SeqConfig;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use seq2seq::{DecodeStep, DecodeSteps, Seq2Seq};
