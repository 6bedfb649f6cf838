//! Adam 옵티마이저.
//!
//! ```text
//! m = β1·m + (1 − β1)·g
//! v = β2·v + (1 − β2)·g²
//! θ = θ − lr · m̂ / (√v̂ + ε),  m̂ = m / (1 − β1ᵗ), v̂ = v / (1 − β2ᵗ)
//! ```
//!
//! 모멘트 상태는 각 [`Param`]에 함께 저장됩니다.

use serde::{Deserialize, Serialize};

use super::network::Param;

/// Adam 하이퍼파라미터와 타임스텝.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: i32,
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.001)
    }
}

impl Adam {
    /// 학습률을 지정해 생성 (β1 0.9, β2 0.999, ε 1e-7).
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
        }
    }

    /// 현재 타임스텝.
    pub fn timestep(&self) -> i32 {
        self.t
    }

    /// 누적된 기울기로 모든 파라미터를 갱신하고 기울기를 초기화합니다.
    pub fn step<'a>(&mut self, params: impl IntoIterator<Item = &'a mut Param>) {
        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t);
        let (b1, b2, lr, eps) = (self.beta1, self.beta2, self.learning_rate, self.epsilon);

        for param in params {
            ndarray::Zip::from(&mut param.value)
                .and(&mut param.m)
                .and(&mut param.v)
                .and(&param.grad)
                .for_each(|w, m, v, &g| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    let m_hat = *m / bias_correction1;
                    let v_hat = *v / bias_correction2;
                    *w -= lr * m_hat / (v_hat.sqrt() + eps);
                });
            param.zero_grad();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        let mut param = Param::new(array![[1.0, -1.0]]);
        param.grad = array![[0.5, -2.0]];

        let mut adam = Adam::new(0.1);
        adam.step([&mut param]);

        // 첫 스텝은 기울기 부호 방향으로 거의 lr만큼 이동
        assert!((param.value[[0, 0]] - 0.9).abs() < 1e-6);
        assert!((param.value[[0, 1]] + 0.9).abs() < 1e-6);
        assert_eq!(param.grad, array![[0.0, 0.0]]);
        assert_eq!(adam.timestep(), 1);
    }

    #[test]
    fn test_minimizes_quadratic() {
        let mut param = Param::new(array![[5.0]]);
        let mut adam = Adam::new(0.1);

        for _ in 0..500 {
            // d/dw (w − 2)²
            param.grad = param.value.mapv(|w| 2.0 * (w - 2.0));
            adam.step([&mut param]);
        }

        assert!((param.value[[0, 0]] - 2.0).abs() < 0.05);
    }
}
