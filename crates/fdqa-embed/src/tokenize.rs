use candle_core::{Device, Tensor};
use fdqa_core::{Error, Result};
use tokenizers::Tokenizer;

/// Encodes one text as `[1, T]` id and mask tensors, truncated to `max_len`.
pub fn tokenize_on_device(tokenizer: &Tokenizer, text: &str, max_len: usize, device: &Device) -> Result<(Tensor, Tensor)> {
    let enc = tokenizer.encode(text, true).map_err(|e| Error::Embedding(format!("tokenization failed: {e}")))?;
    let mut ids = enc.get_ids().to_vec();
    let mut mask = enc.get_attention_mask().to_vec();
    if ids.len() > max_len { ids.truncate(max_len); mask.truncate(max_len); }
    let len = ids.len();
    let to_err = |e: candle_core::Error| Error::Embedding(e.to_string());
    let input_ids = Tensor::from_iter(ids, device).and_then(|t| t.reshape((1, len))).map_err(to_err)?;
    let attention_mask = Tensor::from_iter(mask, device).and_then(|t| t.reshape((1, len))).map_err(to_err)?;
    Ok((input_ids, attention_mask))
}
