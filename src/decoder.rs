use tch::{
    nn::{embedding, gru, linear, Embedding, GRUState, Linear, Path, RNNConfig, GRU, RNN},
    Kind::Float,
    Tensor,
};

use crate::{attention::Attention, config::Seq2SeqConfig};

/// Attention-aware decoder advancing one target timestep at a time.
///
/// Holds no state between calls; the caller threads the hidden state through
/// explicitly.
pub struct Decoder {
    embedding: Embedding,
    rnn: GRU,
    attention: Attention,
    out: Linear,
    dropout: f64,
    /// Target vocabulary size, the width of each score vector.
    pub output_dim: i64,
}

impl Decoder {
    pub fn new(vs: &Path, config: &Seq2SeqConfig, attention: Attention) -> Decoder {
        let embedding = embedding(
            vs / "embedding",
            config.output_vocab_size,
            config.embed_dim,
            Default::default(),
        );
        // The GRU consumes the token embedding alongside the attention
        // context, a single layer stepping once per call.
        let rnn = gru(
            vs / "rnn",
            config.embed_dim + config.effective_enc_hidden_dim(),
            config.dec_hidden_dim,
            RNNConfig {
                batch_first: false,
                ..Default::default()
            },
        );
        let out = linear(
            vs / "out",
            config.embed_dim + config.effective_enc_hidden_dim() + config.dec_hidden_dim,
            config.output_vocab_size,
            Default::default(),
        );
        Decoder {
            embedding,
            rnn,
            attention,
            out,
            dropout: config.dropout_rate,
            output_dim: config.output_vocab_size,
        }
    }

    /// One decoding step.
    ///
    /// `input` is one token index per batch element `[batch]`, `hidden` the
    /// prior decoder state `[1, batch, dec_hid]`, `encoder_outputs` the full
    /// encoded source `[src_len, batch, enc_hid * dirs]`. Returns vocabulary
    /// scores `[batch, output_dim]` and the new hidden state.
    pub fn forward(
        &self,
        input: &Tensor,
        hidden: &Tensor,
        encoder_outputs: &Tensor,
        train: bool,
    ) -> (Tensor, Tensor) {
        // [batch] -> [1, batch] -> [1, batch, embed_dim]
        let embedded = input
            .unsqueeze(0)
            .apply(&self.embedding)
            .dropout(self.dropout, train);
        // [src_len, batch, 1]
        let weights = self.attention.forward(hidden, encoder_outputs);
        // Context vector: convex combination of encoder outputs along the
        // source axis -> [1, batch, enc_hid * dirs]
        let context = (weights * encoder_outputs).sum_dim_intlist(&[0i64][..], true, Float);
        // Step the GRU once from the caller's hidden state.
        let rnn_input = Tensor::cat(&[&embedded, &context], 2);
        let (output, GRUState(new_hidden)) = self
            .rnn
            .seq_init(&rnn_input, &GRUState(hidden.shallow_clone()));
        // Project embedding + context + new hidden down to vocabulary scores.
        let scores = Tensor::cat(&[&embedded, &context, &output], 2)
            .apply(&self.out)
            .squeeze_dim(0);
        (scores, new_hidden)
    }
}
