use tch::{
    nn::{embedding, lstm, Embedding, LSTMState, Path, RNNConfig, LSTM, RNN},
    Tensor,
};

use crate::config::Seq2SeqConfig;

/// Source-side encoder: embedding lookup followed by a multi-layer
/// (optionally bidirectional) LSTM over the whole sequence.
pub struct Encoder {
    embedding: Embedding,
    rnn: LSTM,
    dropout: f64,
}

impl Encoder {
    pub fn new(vs: &Path, config: &Seq2SeqConfig) -> Encoder {
        let embedding = embedding(
            vs / "embedding",
            config.input_vocab_size,
            config.embed_dim,
            Default::default(),
        );
        let rnn = lstm(
            vs / "rnn",
            config.embed_dim,
            config.enc_hidden_dim,
            RNNConfig {
                num_layers: config.num_layers,
                // inter-layer dropout, only effective for num_layers > 1
                dropout: config.dropout_rate,
                bidirectional: config.bidirectional,
                batch_first: false,
                ..Default::default()
            },
        );
        Encoder {
            embedding,
            rnn,
            dropout: config.dropout_rate,
        }
    }

    /// Encodes a `[src_len, batch]` tensor of token indices.
    ///
    /// Returns the per-timestep outputs `[src_len, batch, enc_hidden_dim *
    /// num_directions]` plus the final state, whose hidden and cell tensors
    /// are shaped `[num_layers * num_directions, batch, enc_hidden_dim]`.
    /// Indices outside the vocabulary are not checked here; libtorch treats
    /// them as fatal.
    pub fn forward(&self, src: &Tensor, train: bool) -> (Tensor, LSTMState) {
        let batch_size = src.size()[1];
        // [src_len, batch] -> [src_len, batch, embed_dim]
        let embedded = src.apply(&self.embedding).dropout(self.dropout, train);
        let state = self.rnn.zero_state(batch_size);
        self.rnn.seq_init(&embedded, &state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn, Device, Kind};

    fn random_tokens(len: i64, batch: i64, vocab: i64) -> Tensor {
        Tensor::randint(vocab, &[len, batch], (Kind::Int64, Device::Cpu))
    }

    #[test]
    fn test_unidirectional_shapes() {
        let config = Seq2SeqConfig {
            input_vocab_size: 40,
            embed_dim: 8,
            enc_hidden_dim: 16,
            num_layers: 1,
            dropout_rate: 0.0,
            bidirectional: false,
            ..Seq2SeqConfig::default()
        };
        let vs = nn::VarStore::new(Device::Cpu);
        let encoder = Encoder::new(&vs.root(), &config);
        let src = random_tokens(7, 3, 40);
        let (outputs, state) = encoder.forward(&src, false);
        assert_eq!(outputs.size(), &[7, 3, 16]);
        assert_eq!(state.h().size(), &[1, 3, 16]);
        assert_eq!(state.c().size(), &[1, 3, 16]);
    }

    #[test]
    fn test_bidirectional_two_layer_shapes() {
        let config = Seq2SeqConfig {
            input_vocab_size: 40,
            embed_dim: 8,
            enc_hidden_dim: 16,
            num_layers: 2,
            dropout_rate: 0.0,
            bidirectional: true,
            ..Seq2SeqConfig::default()
        };
        let vs = nn::VarStore::new(Device::Cpu);
        let encoder = Encoder::new(&vs.root(), &config);
        let src = random_tokens(7, 3, 40);
        let (outputs, state) = encoder.forward(&src, false);
        // outputs concatenate both directions; states stack layers x directions
        assert_eq!(outputs.size(), &[7, 3, 32]);
        assert_eq!(state.h().size(), &[4, 3, 16]);
        assert_eq!(state.c().size(), &[4, 3, 16]);
    }

    #[test]
    fn test_stateless_across_calls() {
        let config = Seq2SeqConfig {
            input_vocab_size: 40,
            embed_dim: 8,
            enc_hidden_dim: 16,
            dropout_rate: 0.0,
            ..Seq2SeqConfig::default()
        };
        let vs = nn::VarStore::new(Device::Cpu);
        let encoder = Encoder::new(&vs.root(), &config);
        let src = random_tokens(5, 2, 40);
        // No state is retained between forward calls, so outputs are identical.
        let (first, _) = encoder.forward(&src, false);
        let (second, _) = encoder.forward(&src, false);
        assert!(first.equal(&second));
    }
}
