use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::BinaryCrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::{gelu, sigmoid},
};

/// Hyper-parameters of the encoder and its classification head
#[derive(Config, Debug)]
pub struct EncoderClassifierConfig {
    pub vocab_size:              usize,
    pub max_position_embeddings: usize,
    pub hidden_size:             usize,
    pub num_heads:               usize,
    pub num_layers:              usize,
    pub intermediate_size:       usize,
    pub dropout:                 f64,
    #[config(default = 2)]
    pub num_labels:              usize,
    #[config(default = 1e-12)]
    pub layer_norm_eps:          f64,
}

impl EncoderClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> EncoderClassifier<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.hidden_size).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_position_embeddings, self.hidden_size).init(device);
        let embedding_norm     = self.layer_norm().init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let pooler     = LinearConfig::new(self.hidden_size, self.hidden_size).init(device);
        let classifier = LinearConfig::new(self.hidden_size, self.num_labels).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        EncoderClassifier {
            token_embedding, position_embedding, embedding_norm, layers,
            pooler, classifier, dropout,
        }
    }

    fn layer_norm(&self) -> LayerNormConfig {
        LayerNormConfig::new(self.hidden_size).with_epsilon(self.layer_norm_eps)
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.hidden_size, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.hidden_size, self.intermediate_size).init(device);
        let ffn_linear2 = LinearConfig::new(self.intermediate_size, self.hidden_size).init(device);
        let norm1   = self.layer_norm().init(device);
        let norm2   = self.layer_norm().init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// `pad_mask` is true at padding positions, which attention ignores.
    pub fn forward(&self, x: Tensor<B, 3>, pad_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(pad_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// BERT-style encoder with a sequence classification head on [CLS]
#[derive(Module, Debug)]
pub struct EncoderClassifier<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub embedding_norm:     LayerNorm<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub pooler:             Linear<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
}

pub struct ClassificationOutput<B: Backend> {
    /// Scalar loss, shape [1]
    pub loss:   Tensor<B, 1>,
    /// Raw scores, shape [batch, num_labels]
    pub logits: Tensor<B, 2>,
}

impl<B: Backend> EncoderClassifier<B> {
    /// input_ids, attention_mask: [batch, seq_len] → logits: [batch, num_labels]
    pub fn forward(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();
        let device = input_ids.device();

        let tok_emb = self.token_embedding.forward(input_ids);

        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let pad_mask = attention_mask.equal_elem(0);

        let mut x = self.dropout.forward(self.embedding_norm.forward(tok_emb + pos_emb));
        for layer in &self.layers {
            x = layer.forward(x, pad_mask.clone());
        }

        // [CLS] is always at position 0
        let [_, _, hidden] = x.dims();
        let cls = x
            .slice([0..batch_size, 0..1, 0..hidden])
            .reshape([batch_size, hidden]);
        let pooled = self.pooler.forward(cls).tanh();

        self.classifier.forward(self.dropout.forward(pooled))
    }

    /// Forward pass plus binary cross-entropy against one-hot targets
    pub fn forward_classification(
        &self,
        input_ids:      Tensor<B, 2, Int>,
        attention_mask: Tensor<B, 2, Int>,
        targets:        Tensor<B, 2, Int>,
    ) -> ClassificationOutput<B> {
        let logits = self.forward(input_ids, attention_mask);
        let loss = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device())
            .forward(logits.clone(), targets);
        ClassificationOutput { loss, logits }
    }
}

/// Sigmoid probability of the "bound" class, shape [batch]
pub fn bound_probabilities<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1> {
    let [batch_size, _] = logits.dims();
    sigmoid(logits)
        .slice([0..batch_size, 1..2])
        .reshape([batch_size])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    pub(crate) fn tiny_config() -> EncoderClassifierConfig {
        EncoderClassifierConfig::new(16, 12, 8, 2, 2, 16, 0.0)
    }

    fn batch(device: &<TestBackend as Backend>::Device) -> (Tensor<TestBackend, 2, Int>, Tensor<TestBackend, 2, Int>) {
        let ids = Tensor::<TestBackend, 1, Int>::from_ints([2, 9, 10, 3, 0, 0, 2, 11, 12, 13, 3, 0].as_slice(), device)
            .reshape([2, 6]);
        let mask = Tensor::<TestBackend, 1, Int>::from_ints([1, 1, 1, 1, 0, 0, 1, 1, 1, 1, 1, 0].as_slice(), device)
            .reshape([2, 6]);
        (ids, mask)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device);
        let (ids, mask) = batch(&device);
        assert_eq!(model.forward(ids, mask).dims(), [2, 2]);
    }

    #[test]
    fn test_loss_is_positive_scalar() {
        let device = Default::default();
        let model = tiny_config().init::<TestBackend>(&device);
        let (ids, mask) = batch(&device);
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([0, 1, 1, 0].as_slice(), &device)
            .reshape([2, 2]);

        let output = model.forward_classification(ids, mask, targets);
        assert_eq!(output.loss.dims(), [1]);
        assert!(output.loss.into_scalar().elem::<f32>() > 0.0);
    }

    #[test]
    fn test_bound_probabilities_in_unit_interval() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats([[0.0, 0.0], [-3.0, 3.0]], &device);
        let probs: Vec<f32> = bound_probabilities(logits).into_data().convert::<f32>().to_vec().unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs[1] > 0.95);
    }
}
