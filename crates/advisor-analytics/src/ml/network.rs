//! 순환 신경망 구성 요소.
//!
//! LSTM 층(게이트 i, f, g, o), 완전연결 층, 역드롭아웃을 ndarray로 구현하고
//! 시간 역전파(BPTT)로 기울기를 계산합니다.
//!
//! 시퀀스는 시간 순서의 `Vec<Array2<f64>>`이며 각 원소는 `[배치, 특성]` 행렬입니다.

use ndarray::{s, Array1, Array2, Axis};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{MlError, MlResult};

/// 학습 가능한 파라미터와 기울기, Adam 모멘트.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub value: Array2<f64>,
    pub grad: Array2<f64>,
    pub m: Array2<f64>,
    pub v: Array2<f64>,
}

impl Param {
    /// 초기값으로 생성.
    pub fn new(value: Array2<f64>) -> Self {
        let dim = value.raw_dim();
        Self {
            grad: Array2::zeros(dim),
            m: Array2::zeros(dim),
            v: Array2::zeros(dim),
            value,
        }
    }

    /// Glorot 균등분포 초기화.
    fn glorot<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (rows + cols) as f64).sqrt();
        Self::new(Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-limit..limit)))
    }

    /// 기울기 초기화.
    pub fn zero_grad(&mut self) {
        self.grad.fill(0.0);
    }

    /// 값이 모두 유한한지 여부.
    pub fn is_finite(&self) -> bool {
        self.value.iter().all(|v| v.is_finite())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// 활성화 함수.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Linear,
    Relu,
}

/// 완전연결 층. `y = act(x·W + b)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    weight: Param,
    bias: Param,
    activation: Activation,
}

/// 완전연결 층 역전파용 캐시.
#[derive(Debug, Clone)]
pub struct DenseCache {
    input: Array2<f64>,
    pre_activation: Array2<f64>,
}

impl Dense {
    /// Glorot 초기화된 층.
    pub fn new<R: Rng>(input: usize, output: usize, activation: Activation, rng: &mut R) -> Self {
        Self {
            weight: Param::glorot(input, output, rng),
            bias: Param::new(Array2::zeros((1, output))),
            activation,
        }
    }

    /// 순전파.
    pub fn forward(&self, x: &Array2<f64>) -> (Array2<f64>, DenseCache) {
        let pre = x.dot(&self.weight.value) + &self.bias.value;
        let out = match self.activation {
            Activation::Linear => pre.clone(),
            Activation::Relu => pre.mapv(|v| v.max(0.0)),
        };
        (
            out,
            DenseCache {
                input: x.clone(),
                pre_activation: pre,
            },
        )
    }

    /// 역전파. 기울기를 누적하고 입력에 대한 기울기를 반환합니다.
    pub fn backward(&mut self, cache: &DenseCache, dout: &Array2<f64>) -> Array2<f64> {
        let dpre = match self.activation {
            Activation::Linear => dout.clone(),
            Activation::Relu => {
                let mut d = dout.clone();
                ndarray::Zip::from(&mut d)
                    .and(&cache.pre_activation)
                    .for_each(|d, &p| {
                        if p <= 0.0 {
                            *d = 0.0;
                        }
                    });
                d
            }
        };

        self.weight.grad += &cache.input.t().dot(&dpre);
        self.bias.grad += &dpre.sum_axis(Axis(0)).insert_axis(Axis(0));
        dpre.dot(&self.weight.value.t())
    }

    fn params_mut(&mut self) -> [&mut Param; 2] {
        [&mut self.weight, &mut self.bias]
    }
}

/// LSTM 한 스텝의 역전파용 값.
#[derive(Debug, Clone)]
struct LstmStep {
    x: Array2<f64>,
    h_prev: Array2<f64>,
    c_prev: Array2<f64>,
    i: Array2<f64>,
    f: Array2<f64>,
    g: Array2<f64>,
    o: Array2<f64>,
    tanh_c: Array2<f64>,
}

/// LSTM 층.
///
/// 가중치는 게이트 순서 `[i | f | g | o]`로 열 방향 연결되어 있습니다:
/// `W: [입력, 4H]`, `U: [H, 4H]`, `b: [1, 4H]`. 망각 게이트 편향은 1로 초기화합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    hidden: usize,
    w: Param,
    u: Param,
    b: Param,
}

impl LstmLayer {
    /// 새 LSTM 층.
    pub fn new<R: Rng>(input: usize, hidden: usize, rng: &mut R) -> Self {
        let mut bias = Array2::zeros((1, 4 * hidden));
        bias.slice_mut(s![.., hidden..2 * hidden]).fill(1.0);

        Self {
            hidden,
            w: Param::glorot(input, 4 * hidden, rng),
            u: Param::glorot(hidden, 4 * hidden, rng),
            b: Param::new(bias),
        }
    }

    /// 은닉 상태 크기.
    pub fn hidden_size(&self) -> usize {
        self.hidden
    }

    /// 전체 시퀀스 순전파. 각 시점의 은닉 상태를 반환합니다.
    fn forward(&self, inputs: &[Array2<f64>]) -> (Vec<Array2<f64>>, Vec<LstmStep>) {
        let batch = inputs.first().map_or(0, |x| x.nrows());
        let hsz = self.hidden;
        let mut h = Array2::zeros((batch, hsz));
        let mut c = Array2::zeros((batch, hsz));
        let mut outputs = Vec::with_capacity(inputs.len());
        let mut steps = Vec::with_capacity(inputs.len());

        for x in inputs {
            let z = x.dot(&self.w.value) + h.dot(&self.u.value) + &self.b.value;
            let i = z.slice(s![.., 0..hsz]).mapv(sigmoid);
            let f = z.slice(s![.., hsz..2 * hsz]).mapv(sigmoid);
            let g = z.slice(s![.., 2 * hsz..3 * hsz]).mapv(f64::tanh);
            let o = z.slice(s![.., 3 * hsz..4 * hsz]).mapv(sigmoid);

            let c_next = &f * &c + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            steps.push(LstmStep {
                x: x.clone(),
                h_prev: h,
                c_prev: c,
                i,
                f,
                g,
                o,
                tanh_c,
            });
            outputs.push(h_next.clone());
            h = h_next;
            c = c_next;
        }

        (outputs, steps)
    }

    /// 시간 역전파. `dh_seq[t]`는 시점 t의 출력에 대한 기울기입니다.
    fn backward(&mut self, steps: &[LstmStep], dh_seq: &[Array2<f64>]) -> Vec<Array2<f64>> {
        let hsz = self.hidden;
        let mut dx_seq = vec![Array2::zeros((0, 0)); steps.len()];
        let Some(first) = steps.first() else {
            return dx_seq;
        };
        let batch = first.x.nrows();
        let mut dh_next = Array2::<f64>::zeros((batch, hsz));
        let mut dc_next = Array2::<f64>::zeros((batch, hsz));

        for t in (0..steps.len()).rev() {
            let step = &steps[t];
            let dh = &dh_seq[t] + &dh_next;

            let d_o = &dh * &step.tanh_c;
            let dc = &dh * &step.o * step.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let d_i = &dc * &step.g;
            let d_g = &dc * &step.i;
            let d_f = &dc * &step.c_prev;
            dc_next = &dc * &step.f;

            let mut dz = Array2::zeros((batch, 4 * hsz));
            dz.slice_mut(s![.., 0..hsz])
                .assign(&(&d_i * &step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., hsz..2 * hsz])
                .assign(&(&d_f * &step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![.., 2 * hsz..3 * hsz])
                .assign(&(&d_g * &step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![.., 3 * hsz..4 * hsz])
                .assign(&(&d_o * &step.o.mapv(|v| v * (1.0 - v))));

            self.w.grad += &step.x.t().dot(&dz);
            self.u.grad += &step.h_prev.t().dot(&dz);
            self.b.grad += &dz.sum_axis(Axis(0)).insert_axis(Axis(0));

            dx_seq[t] = dz.dot(&self.w.value.t());
            dh_next = dz.dot(&self.u.value.t());
        }

        dx_seq
    }

    fn params_mut(&mut self) -> [&mut Param; 3] {
        [&mut self.w, &mut self.u, &mut self.b]
    }
}

/// 역드롭아웃 마스크. 유지 확률로 나눠 기대값을 보존합니다.
fn dropout_mask(rows: usize, cols: usize, rate: f64, rng: &mut dyn RngCore) -> Array2<f64> {
    if rate <= 0.0 {
        return Array2::ones((rows, cols));
    }
    let keep = 1.0 - rate;
    Array2::from_shape_fn((rows, cols), |_| {
        if rng.gen::<f64>() < keep {
            1.0 / keep
        } else {
            0.0
        }
    })
}

/// 순전파 모드.
enum Mode<'a> {
    Train(&'a mut dyn RngCore),
    Eval,
}

/// LSTM 층 하나의 순전파 캐시.
struct LayerCache {
    steps: Vec<LstmStep>,
    /// 드롭아웃 마스크 (시퀀스 반환 층은 시점별, 마지막 층은 최종 상태 하나)
    masks: Vec<Array2<f64>>,
}

/// 역전파용 순전파 캐시.
pub struct ForwardCache {
    layers: Vec<LayerCache>,
    hidden: DenseCache,
    output: DenseCache,
}

/// 적층 LSTM 회귀 네트워크.
///
/// LSTM 층들(마지막 층만 최종 상태 반환) → 드롭아웃 → Dense(ReLU) → Dense(1)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceNetwork {
    layers: Vec<LstmLayer>,
    hidden: Dense,
    output: Dense,
    dropout: f64,
}

impl SequenceNetwork {
    /// 새 네트워크.
    pub fn new<R: Rng>(
        input_size: usize,
        lstm_units: &[usize],
        dense_units: usize,
        dropout: f64,
        rng: &mut R,
    ) -> MlResult<Self> {
        if lstm_units.is_empty() || lstm_units.contains(&0) || dense_units == 0 || input_size == 0 {
            return Err(MlError::InvalidInput(format!(
                "invalid network shape: input {}, lstm {:?}, dense {}",
                input_size, lstm_units, dense_units
            )));
        }
        if !(0.0..1.0).contains(&dropout) {
            return Err(MlError::InvalidInput(format!(
                "dropout must be in [0, 1), got {}",
                dropout
            )));
        }

        let mut layers = Vec::with_capacity(lstm_units.len());
        let mut input = input_size;
        for &units in lstm_units {
            layers.push(LstmLayer::new(input, units, rng));
            input = units;
        }

        Ok(Self {
            layers,
            hidden: Dense::new(input, dense_units, Activation::Relu, rng),
            output: Dense::new(dense_units, 1, Activation::Linear, rng),
            dropout,
        })
    }

    /// 학습 모드 순전파 (드롭아웃 적용).
    pub fn forward_train<R: RngCore>(&self, x: &[Array2<f64>], rng: &mut R) -> (Array1<f64>, ForwardCache) {
        self.forward(x, Mode::Train(rng))
    }

    /// 추론 (드롭아웃 없음).
    pub fn predict(&self, x: &[Array2<f64>]) -> Array1<f64> {
        self.forward(x, Mode::Eval).0
    }

    fn forward(&self, x: &[Array2<f64>], mut mode: Mode<'_>) -> (Array1<f64>, ForwardCache) {
        let mut seq: Vec<Array2<f64>> = x.to_vec();
        let mut caches = Vec::with_capacity(self.layers.len());
        let last_layer = self.layers.len() - 1;
        let mut final_state = Array2::zeros((0, 0));

        for (li, layer) in self.layers.iter().enumerate() {
            let (outputs, steps) = layer.forward(&seq);
            let targets: Vec<Array2<f64>> = if li == last_layer {
                outputs.last().cloned().into_iter().collect()
            } else {
                outputs
            };

            let mut masks = Vec::new();
            let dropped: Vec<Array2<f64>> = match &mut mode {
                Mode::Train(rng) => targets
                    .into_iter()
                    .map(|h| {
                        let mask = dropout_mask(h.nrows(), h.ncols(), self.dropout, &mut **rng);
                        let out = &h * &mask;
                        masks.push(mask);
                        out
                    })
                    .collect(),
                Mode::Eval => targets,
            };

            caches.push(LayerCache { steps, masks });
            if li == last_layer {
                final_state = dropped.into_iter().next().unwrap_or_else(|| Array2::zeros((0, 0)));
            } else {
                seq = dropped;
            }
        }

        let (hidden_out, hidden_cache) = self.hidden.forward(&final_state);
        let (out, output_cache) = self.output.forward(&hidden_out);

        (
            out.column(0).to_owned(),
            ForwardCache {
                layers: caches,
                hidden: hidden_cache,
                output: output_cache,
            },
        )
    }

    /// 예측값에 대한 손실 기울기로 모든 파라미터의 기울기를 누적합니다.
    pub fn backward(&mut self, cache: &ForwardCache, dpred: &Array1<f64>) {
        let dout = dpred.clone().insert_axis(Axis(1));
        let dhidden = self.output.backward(&cache.output, &dout);
        let mut dstate = self.hidden.backward(&cache.hidden, &dhidden);

        let last_layer = self.layers.len() - 1;
        let mut dh_seq: Vec<Array2<f64>> = Vec::new();

        for li in (0..self.layers.len()).rev() {
            let layer_cache = &cache.layers[li];
            let steps = layer_cache.steps.len();

            if li == last_layer {
                if let Some(mask) = layer_cache.masks.first() {
                    dstate = &dstate * mask;
                }
                let batch = dstate.nrows();
                dh_seq = vec![Array2::zeros((batch, self.layers[li].hidden_size())); steps];
                if let Some(last) = dh_seq.last_mut() {
                    *last = dstate.clone();
                }
            } else {
                for (dh, mask) in dh_seq.iter_mut().zip(layer_cache.masks.iter()) {
                    *dh = &*dh * mask;
                }
            }

            dh_seq = self.layers[li].backward(&layer_cache.steps, &dh_seq);
        }
    }

    /// 모든 파라미터.
    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        let mut params: Vec<&mut Param> = Vec::new();
        for layer in self.layers.iter_mut() {
            params.extend(layer.params_mut());
        }
        params.extend(self.hidden.params_mut());
        params.extend(self.output.params_mut());
        params
    }

    /// 모든 가중치가 유한한지 여부.
    pub fn is_finite(&self) -> bool {
        self.layers
            .iter()
            .all(|l| l.w.is_finite() && l.u.is_finite() && l.b.is_finite())
            && [&self.hidden, &self.output]
                .iter()
                .all(|d| d.weight.is_finite() && d.bias.is_finite())
    }
}
