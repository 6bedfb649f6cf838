//! Huber 손실.
//!
//! |e| <= δ 이면 ½e², 아니면 δ(|e| − ½δ). 배치 평균을 사용합니다.

use ndarray::Array1;

/// Huber 손실 함수.
#[derive(Debug, Clone, Copy)]
pub struct HuberLoss {
    delta: f64,
}

impl Default for HuberLoss {
    fn default() -> Self {
        Self { delta: 1.0 }
    }
}

impl HuberLoss {
    /// δ를 지정해 생성.
    pub fn new(delta: f64) -> Self {
        Self { delta }
    }

    /// 평균 손실.
    pub fn loss(&self, predicted: &Array1<f64>, target: &Array1<f64>) -> f64 {
        if predicted.is_empty() {
            return 0.0;
        }
        let total: f64 = predicted
            .iter()
            .zip(target.iter())
            .map(|(p, t)| {
                let e = (p - t).abs();
                if e <= self.delta {
                    0.5 * e * e
                } else {
                    self.delta * (e - 0.5 * self.delta)
                }
            })
            .sum();
        total / predicted.len() as f64
    }

    /// 예측값에 대한 평균 손실의 기울기.
    pub fn gradient(&self, predicted: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
        let n = predicted.len().max(1) as f64;
        let mut grad = predicted - target;
        grad.mapv_inplace(|e| e.clamp(-self.delta, self.delta) / n);
        grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_huber_quadratic_and_linear_regions() {
        let huber = HuberLoss::default();
        let target = array![0.0, 0.0];

        // 0.5×0.25 = 0.125, 1×(3 − 0.5) = 2.5
        let loss = huber.loss(&array![0.5, 3.0], &target);
        assert!((loss - (0.125 + 2.5) / 2.0).abs() < 1e-12);

        let grad = huber.gradient(&array![0.5, -3.0], &target);
        assert!((grad[0] - 0.25).abs() < 1e-12);
        assert!((grad[1] + 0.5).abs() < 1e-12);
    }
}
