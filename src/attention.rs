use tch::{
    nn::{linear, Linear, Path},
    Kind::Float,
    Tensor,
};

use crate::config::Seq2SeqConfig;

/// Softmax over the source-position axis (dim 0) with temperature scaling.
///
/// Temperature flattens (>1) or sharpens (<1) the distribution independently
/// of the raw energy magnitudes.
pub fn softmax_temperature(x: &Tensor, temperature: f64) -> Tensor {
    (x / temperature).softmax(0, Float)
}

/// Additive attention scorer: rates each encoder output against the
/// decoder's current hidden state and normalizes the scores into weights.
pub struct Attention {
    attn: Linear,
    v: Linear,
    temperature: f64,
}

impl Attention {
    pub fn new(vs: &Path, config: &Seq2SeqConfig) -> Attention {
        let attn = linear(
            vs / "attn",
            config.effective_enc_hidden_dim() + config.dec_hidden_dim,
            config.enc_hidden_dim,
            Default::default(),
        );
        let v = linear(vs / "v", config.enc_hidden_dim, 1, Default::default());
        Attention {
            attn,
            v,
            temperature: config.attention_temperature,
        }
    }

    /// Computes attention weights for one decoder step.
    ///
    /// `hidden` is the decoder's current hidden state `[1, batch, dec_hid]`;
    /// `encoder_outputs` is the full encoded source `[src_len, batch,
    /// enc_hid * dirs]`. Returns weights `[src_len, batch, 1]` summing to 1
    /// along the source axis — a soft alignment, never an argmax pick.
    pub fn forward(&self, hidden: &Tensor, encoder_outputs: &Tensor) -> Tensor {
        let src_len = encoder_outputs.size()[0];
        // [1, batch, dec_hid] -> [src_len, batch, dec_hid]
        let hidden = hidden.repeat(&[src_len, 1, 1]);
        // [src_len, batch, enc_hid * dirs + dec_hid]
        let concat = Tensor::cat(&[encoder_outputs, &hidden], 2);
        // energy per source position: [src_len, batch, enc_hid] -> [src_len, batch, 1]
        let energy = concat.apply(&self.attn).tanh();
        softmax_temperature(&energy.apply(&self.v), self.temperature)
    }
}
