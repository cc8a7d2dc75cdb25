use anyhow::Result;
use rand::Rng;
use tch::{nn::Path, Kind::Float, Tensor};

use crate::{attention::Attention, config::Seq2SeqConfig, decoder::Decoder, encoder::Encoder};

/// Encoder-decoder pair plus the autoregressive decoding loop.
pub struct Seq2Seq {
    encoder: Encoder,
    decoder: Decoder,
    bidirectional: bool,
    teacher_forcing_ratio: f64,
}

impl Seq2Seq {
    /// Builds the full stack under `vs`, validating the configuration first.
    pub fn new(vs: &Path, config: &Seq2SeqConfig) -> Result<Seq2Seq> {
        config.validate()?;
        let encoder = Encoder::new(&(vs / "encoder"), config);
        let attention = Attention::new(&(vs / "attention"), config);
        let decoder = Decoder::new(&(vs / "decoder"), config, attention);
        Ok(Seq2Seq {
            encoder,
            decoder,
            bidirectional: config.bidirectional,
            teacher_forcing_ratio: config.teacher_forcing_ratio,
        })
    }

    /// Decoder's initial hidden state from the encoder's final state:
    /// the last layer's hidden, with the two direction states concatenated
    /// on the feature axis when bidirectional. Shape `[1, batch, dec_hid]`.
    fn initial_hidden(&self, enc_hidden: &Tensor) -> Tensor {
        if self.bidirectional {
            Tensor::cat(&[enc_hidden.get(-2), enc_hidden.get(-1)], 1).unsqueeze(0)
        } else {
            enc_hidden.get(-1).unsqueeze(0)
        }
    }

    /// Runs the encoder and returns the lazy per-timestep decoding sequence.
    ///
    /// `src` is `[src_len, batch]`, `trg` is `[trg_len, batch]` with the
    /// start token in row 0. The iterator yields one [`DecodeStep`] per
    /// target timestep `1..trg_len`; at each step an independent draw from
    /// `rng` against `teacher_forcing_ratio` decides whether the next input
    /// is the ground-truth target token or the argmax of the step's scores.
    pub fn decode_steps<'a, R: Rng>(
        &'a self,
        src: &Tensor,
        trg: &'a Tensor,
        teacher_forcing_ratio: f64,
        rng: &'a mut R,
        train: bool,
    ) -> DecodeSteps<'a, R> {
        let (encoder_outputs, state) = self.encoder.forward(src, train);
        let hidden = self.initial_hidden(&state.h());
        // row 0 of trg is the caller-supplied start-of-sequence token
        let input = trg.get(0);
        DecodeSteps {
            decoder: &self.decoder,
            trg,
            encoder_outputs,
            hidden,
            input,
            t: 1,
            trg_len: trg.size()[0],
            teacher_forcing_ratio,
            rng,
            train,
        }
    }

    /// Full forward pass: collects every decoding step into a
    /// `[trg_len, batch, output_vocab_size]` score tensor. Position 0 stays
    /// all-zero, matching the convention that row 0 of `trg` is the supplied
    /// start token rather than a prediction.
    pub fn generate<R: Rng>(
        &self,
        src: &Tensor,
        trg: &Tensor,
        teacher_forcing_ratio: f64,
        rng: &mut R,
        train: bool,
    ) -> Tensor {
        let (trg_len, batch_size) = (trg.size()[0], trg.size()[1]);
        let mut scores = Vec::with_capacity(trg_len as usize);
        scores.push(Tensor::zeros(
            &[batch_size, self.decoder.output_dim],
            (Float, trg.device()),
        ));
        scores.extend(
            self.decode_steps(src, trg, teacher_forcing_ratio, rng, train)
                .map(|step| step.scores),
        );
        Tensor::stack(&scores, 0)
    }

    /// [`Seq2Seq::generate`] with the configured teacher forcing ratio.
    pub fn generate_default<R: Rng>(
        &self,
        src: &Tensor,
        trg: &Tensor,
        rng: &mut R,
        train: bool,
    ) -> Tensor {
        self.generate(src, trg, self.teacher_forcing_ratio, rng, train)
    }
}

/// One decoding timestep: the token indices actually fed to the decoder and
/// the vocabulary scores it produced.
pub struct DecodeStep {
    /// Input token per batch element, `[batch]`.
    pub input: Tensor,
    /// Vocabulary scores, `[batch, output_vocab_size]`.
    pub scores: Tensor,
}

/// Lazy sequence of decoding steps. Strictly sequential: each step's input
/// depends on the previous step's scores or the ground truth.
pub struct DecodeSteps<'a, R: Rng> {
    decoder: &'a Decoder,
    trg: &'a Tensor,
    encoder_outputs: Tensor,
    hidden: Tensor,
    input: Tensor,
    t: i64,
    trg_len: i64,
    teacher_forcing_ratio: f64,
    rng: &'a mut R,
    train: bool,
}

impl<R: Rng> Iterator for DecodeSteps<'_, R> {
    type Item = DecodeStep;

    fn next(&mut self) -> Option<DecodeStep> {
        if self.t >= self.trg_len {
            return None;
        }
        let input = self.input.shallow_clone();
        let (scores, hidden) =
            self.decoder
                .forward(&input, &self.hidden, &self.encoder_outputs, self.train);
        self.hidden = hidden;
        // Independent draw per timestep, so a batch may mix forced and
        // greedy steps across the time axis.
        let teacher_force = self.rng.gen::<f64>() < self.teacher_forcing_ratio;
        self.input = if teacher_force {
            self.trg.get(self.t)
        } else {
            scores.argmax(-1, false)
        };
        self.t += 1;
        Some(DecodeStep { input, scores })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.trg_len - self.t).max(0) as usize;
        (remaining, Some(remaining))
    }
}
