use candle_core::{bail, DType, Result, Tensor};

/// Sentence-embedding pooling over `[B, T, H]` hidden states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pooling {
    /// First (`[CLS]`/`<s>`) token, as configured for KURE-v1 and BGE-M3.
    #[default]
    Cls,
    Mean,
}

impl std::str::FromStr for Pooling {
    type Err = fdqa_core::Error;

    fn from_str(s: &str) -> fdqa_core::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cls" => Ok(Self::Cls),
            "mean" => Ok(Self::Mean),
            other => Err(fdqa_core::Error::InvalidConfig(format!("unknown pooling '{other}'"))),
        }
    }
}

pub fn pool(pooling: Pooling, hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    match pooling {
        Pooling::Cls => cls_l2(hidden),
        Pooling::Mean => masked_mean_l2(hidden, attention_mask),
    }
}

pub fn cls_l2(hidden: &Tensor) -> Result<Tensor> {
    if hidden.dims().len() != 3 { bail!("hidden shape must be [B,T,H], got {:?}", hidden.dims()); }
    let cls = hidden.narrow(1, 0, 1)?.squeeze(1)?;
    l2_normalize(&cls)
}

pub fn masked_mean_l2(hidden: &Tensor, attention_mask: &Tensor) -> Result<Tensor> {
    let dims = hidden.dims();
    if dims.len() != 3 { bail!("hidden shape must be [B,T,H], got {:?}", dims); }
    let hidden_dim = dims[2];

    let mask = attention_mask.to_device(hidden.device())?.to_dtype(hidden.dtype())?;
    let mask_3d = mask.unsqueeze(2)?;
    let mask_broadcast = mask_3d.broadcast_as(hidden.shape()).or_else(|_| mask_3d.repeat((1, 1, hidden_dim)))?;
    let masked = (hidden * &mask_broadcast)?;
    let sum = masked.sum(1)?;
    let lengths = mask.sum(1)?.unsqueeze(1)?.to_dtype(sum.dtype())?;
    let mean = sum.broadcast_div(&lengths)?;
    l2_normalize(&mean)
}

fn l2_normalize(v: &Tensor) -> Result<Tensor> {
    let eps_val = match v.dtype() { DType::F16 => 1e-6f32, _ => 1e-12f32 };
    let eps = Tensor::new(&[eps_val], v.device())?.to_dtype(v.dtype())?.unsqueeze(0)?;
    let norm = v.sqr()?.sum_keepdim(1)?.sqrt()?;
    let norm = norm.broadcast_add(&eps)?;
    v.broadcast_div(&norm)
}
