use anyhow::{bail, Result};

/// Construction-time configuration for the whole encoder-decoder stack.
#[derive(Debug, Clone)]
pub struct Seq2SeqConfig {
    /// Source vocabulary size (rows of the encoder embedding table).
    pub input_vocab_size: i64,
    /// Target vocabulary size (rows of the decoder embedding table and width
    /// of the output score vectors).
    pub output_vocab_size: i64,
    /// Embedding dimension, shared by both embedding tables.
    pub embed_dim: i64,
    /// Encoder LSTM hidden size, per direction.
    pub enc_hidden_dim: i64,
    /// Decoder GRU hidden size.
    pub dec_hidden_dim: i64,
    /// Number of encoder LSTM layers.
    pub num_layers: i64,
    /// Dropout probability applied to embeddings and between LSTM layers.
    pub dropout_rate: f64,
    /// Run the encoder in both time directions and concatenate the outputs.
    pub bidirectional: bool,
    /// Temperature for the attention softmax; higher flattens the weights.
    pub attention_temperature: f64,
    /// Default probability of feeding the ground-truth token at each step.
    pub teacher_forcing_ratio: f64,
}

impl Default for Seq2SeqConfig {
    fn default() -> Self {
        Seq2SeqConfig {
            input_vocab_size: 128,
            output_vocab_size: 128,
            embed_dim: 64,
            enc_hidden_dim: 128,
            dec_hidden_dim: 128,
            num_layers: 1,
            dropout_rate: 0.1,
            bidirectional: false,
            attention_temperature: 10.0,
            teacher_forcing_ratio: 0.5,
        }
    }
}

impl Seq2SeqConfig {
    /// Number of encoder time directions: 2 if bidirectional, else 1.
    pub fn num_directions(&self) -> i64 {
        if self.bidirectional { 2 } else { 1 }
    }

    /// Encoder hidden width as the decoder sees it: per-direction hidden
    /// size times the number of directions.
    pub fn effective_enc_hidden_dim(&self) -> i64 {
        self.num_directions() * self.enc_hidden_dim
    }

    /// Check structural invariants. Shape mismatches caught here would
    /// otherwise surface as opaque libtorch errors deep in the forward pass.
    pub fn validate(&self) -> Result<()> {
        if self.input_vocab_size <= 0 {
            bail!("input_vocab_size must be positive");
        }
        if self.output_vocab_size <= 0 {
            bail!("output_vocab_size must be positive");
        }
        if self.embed_dim <= 0 {
            bail!("embed_dim must be positive");
        }
        if self.enc_hidden_dim <= 0 {
            bail!("enc_hidden_dim must be positive");
        }
        if self.dec_hidden_dim <= 0 {
            bail!("dec_hidden_dim must be positive");
        }
        if self.num_layers <= 0 {
            bail!("num_layers must be positive");
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            bail!("dropout_rate must be in [0, 1)");
        }
        if self.attention_temperature <= 0.0 {
            bail!("attention_temperature must be positive");
        }
        if !(0.0..=1.0).contains(&self.teacher_forcing_ratio) {
            bail!("teacher_forcing_ratio must be in [0, 1]");
        }
        // The decoder's initial hidden state is the encoder's final-layer
        // hidden state, with both direction states concatenated when
        // bidirectional. The widths must line up exactly.
        if self.effective_enc_hidden_dim() != self.dec_hidden_dim {
            bail!(
                "encoder hidden width ({} x {} directions = {}) must equal dec_hidden_dim ({})",
                self.enc_hidden_dim,
                self.num_directions(),
                self.effective_enc_hidden_dim(),
                self.dec_hidden_dim
            );
        }
        Ok(())
    }
}
