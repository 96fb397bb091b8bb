use candle_core::{DType, Device, Tensor};
use fdqa_embed::pool::{cls_l2, pool};
use fdqa_embed::{masked_mean_l2, Pooling};

fn hidden(dev: &Device) -> Tensor {
    // Two tokens with hidden dim 4.
    Tensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], (1, 2, 4), dev).unwrap()
}

fn assert_close(got: &[f32], want: [f32; 4]) {
    for (a, b) in got.iter().cloned().zip(want) {
        assert!((a - b).abs() < 1e-5, "a={a} b={b}");
    }
}

#[test]
fn masked_mean_l2_ignores_padding() {
    let dev = Device::Cpu;
    let mask = Tensor::from_slice(&[1i64, 0i64], (1, 2), &dev).unwrap().to_dtype(DType::F32).unwrap();
    let out = masked_mean_l2(&hidden(&dev), &mask).unwrap();
    let v: Vec<Vec<f32>> = out.to_vec2().unwrap();
    let norm = 30f32.sqrt();
    assert_close(&v[0], [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm]);
}

#[test]
fn cls_pooling_takes_first_token() {
    let dev = Device::Cpu;
    let mask = Tensor::from_slice(&[1u32, 1u32], (1, 2), &dev).unwrap();
    let via_pool: Vec<Vec<f32>> = pool(Pooling::Cls, &hidden(&dev), &mask).unwrap().to_vec2().unwrap();
    let direct: Vec<Vec<f32>> = cls_l2(&hidden(&dev)).unwrap().to_vec2().unwrap();
    let norm = 30f32.sqrt();
    assert_close(&via_pool[0], [1.0 / norm, 2.0 / norm, 3.0 / norm, 4.0 / norm]);
    assert_eq!(via_pool, direct);
}

#[test]
fn pooling_rejects_rank_two_input() {
    let dev = Device::Cpu;
    let flat = Tensor::from_slice(&[1.0f32, 2.0], (1, 2), &dev).unwrap();
    assert!(cls_l2(&flat).is_err());
}
