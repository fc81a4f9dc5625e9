//! CPU kernels for graph operations

use ndarray::{Array1, ArrayView2, Axis, Zip};

use crate::graph::Tensor;
use crate::{Error, Result};

fn matrix_pair<'a>(
    op: &str,
    a: &'a Tensor,
    b: &'a Tensor,
) -> Result<(ArrayView2<'a, f32>, ArrayView2<'a, f32>)> {
    Ok((a.as_matrix(op)?, b.as_matrix(op)?))
}

pub(crate) fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    let (lhs, rhs) = matrix_pair("MatMul", a, b)?;
    if lhs.ncols() != rhs.nrows() {
        return Err(Error::shape_mismatch(
            "MatMul",
            format!("[{}, {k}] x [{k}, _]", lhs.nrows(), k = lhs.ncols()),
            format!("{:?} x {:?}", a.shape(), b.shape()),
        ));
    }
    Ok(Tensor::from_array(lhs.dot(&rhs).into_dyn()))
}

/// `aᵀ x g` for `a: [m, k]`, `g: [m, n]`.
pub(crate) fn matmul_transpose_lhs(a: &Tensor, g: &Tensor) -> Result<Tensor> {
    let (a, g) = matrix_pair("MatMulGrad", a, g)?;
    if a.nrows() != g.nrows() {
        return Err(Error::shape_mismatch("MatMulGrad", a.nrows(), g.nrows()));
    }
    Ok(Tensor::from_array(a.t().dot(&g).into_dyn()))
}

/// `g x bᵀ` for `g: [m, n]`, `b: [k, n]`.
pub(crate) fn matmul_transpose_rhs(g: &Tensor, b: &Tensor) -> Result<Tensor> {
    let (g, b) = matrix_pair("MatMulGrad", g, b)?;
    if g.ncols() != b.ncols() {
        return Err(Error::shape_mismatch("MatMulGrad", g.ncols(), b.ncols()));
    }
    Ok(Tensor::from_array(g.dot(&b.t()).into_dyn()))
}

pub(crate) fn add(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    if a.shape() == b.shape() {
        return Ok(Tensor::from_array(a.array() + b.array()));
    }
    if let ([_, cols], [bias]) = (a.shape(), b.shape()) {
        if cols == bias {
            return Ok(Tensor::from_array(a.array() + b.array()));
        }
    }
    Err(Error::shape_mismatch(
        "Add",
        format!("{:?}", a.shape()),
        format!("{:?}", b.shape()),
    ))
}

/// Sum the rows of `g` into a vector (gradient of a broadcast bias).
pub(crate) fn sum_rows(g: &Tensor) -> Result<Tensor> {
    let g = g.as_matrix("AddGrad")?;
    Ok(Tensor::from_array(g.sum_axis(Axis(0)).into_dyn()))
}

/// Numerically stable softmax over each row.
pub(crate) fn softmax_rows(logits: &Tensor) -> Result<Tensor> {
    let x = logits.as_matrix("Softmax")?;
    let max = x.fold_axis(Axis(1), f32::NEG_INFINITY, |&a, &b| a.max(b));
    let exps = (&x - &max.insert_axis(Axis(1))).mapv(f32::exp);
    let sum = exps.sum_axis(Axis(1));
    Ok(Tensor::from_array((&exps / &sum.insert_axis(Axis(1))).into_dyn()))
}

/// `-sum(labels * log_softmax(logits))` per row.
pub(crate) fn softmax_cross_entropy(labels: &Tensor, logits: &Tensor) -> Result<Tensor> {
    if labels.shape() != logits.shape() {
        return Err(Error::shape_mismatch(
            "SoftmaxCrossEntropyWithLogits",
            format!("{:?}", logits.shape()),
            format!("{:?}", labels.shape()),
        ));
    }
    let (y, x) = matrix_pair("SoftmaxCrossEntropyWithLogits", labels, logits)?;
    let max = x.fold_axis(Axis(1), f32::NEG_INFINITY, |&a, &b| a.max(b));
    let shifted = &x - &max.view().insert_axis(Axis(1));
    let log_sum = shifted.mapv(f32::exp).sum_axis(Axis(1)).mapv(f32::ln) + &max;
    let log_probs = &x - &log_sum.insert_axis(Axis(1));
    let loss = -(&y * &log_probs).sum_axis(Axis(1));
    Ok(Tensor::from_array(loss.into_dyn()))
}

/// Gradient of [`softmax_cross_entropy`] with respect to the logits, scaled
/// per row by the incoming gradient `grad: [m]`.
pub(crate) fn softmax_cross_entropy_grad(
    labels: &Tensor,
    logits: &Tensor,
    grad: &Tensor,
) -> Result<Tensor> {
    let probs = softmax_rows(logits)?;
    let (p, y) = matrix_pair("SoftmaxCrossEntropyGrad", &probs, labels)?;
    if p.dim() != y.dim() || grad.shape() != [p.nrows()] {
        return Err(Error::shape_mismatch(
            "SoftmaxCrossEntropyGrad",
            format!("{:?}", logits.shape()),
            format!("{:?} and {:?}", labels.shape(), grad.shape()),
        ));
    }
    let scale = grad.array().view().insert_axis(Axis(1));
    Ok(Tensor::from_array(&(&p - &y) * &scale))
}

/// Mean of all elements; `NaN` for an empty tensor.
pub(crate) fn reduce_mean(x: &Tensor) -> Tensor {
    Tensor::scalar(x.array().mean().unwrap_or(f32::NAN))
}

/// Index of the first maximum in each row.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn argmax_rows(x: &Tensor) -> Result<Tensor> {
    let x = x.as_matrix("ArgMax")?;
    if x.ncols() == 0 {
        return Err(Error::InvalidInput("ArgMax over an empty axis".into()));
    }
    let indices = x.map_axis(Axis(1), |row| {
        row.iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (j, &v)| {
                if v > best.1 {
                    (j, v)
                } else {
                    best
                }
            })
            .0 as f32
    });
    Ok(Tensor::from_array(indices.into_dyn()))
}

pub(crate) fn equal(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    if a.shape() != b.shape() {
        return Err(Error::shape_mismatch(
            "Equal",
            format!("{:?}", a.shape()),
            format!("{:?}", b.shape()),
        ));
    }
    let mask = Zip::from(a.array())
        .and(b.array())
        .map_collect(|x, y| if x == y { 1.0 } else { 0.0 });
    Ok(Tensor::from_array(mask))
}

/// A row is a hit when fewer than `k` predictions are strictly larger than
/// the target's. Non-finite or out-of-range targets and rows with a
/// non-finite prediction miss.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn in_top_k(predictions: &Tensor, targets: &Tensor, k: usize) -> Result<Tensor> {
    let pred = predictions.as_matrix("InTopK")?;
    let (m, n) = pred.dim();
    if targets.shape() != [m] {
        return Err(Error::shape_mismatch(
            "InTopK",
            format!("[{m}]"),
            format!("{:?}", targets.shape()),
        ));
    }
    let hits: Array1<f32> = pred
        .outer_iter()
        .zip(targets.data())
        .map(|(row, &target)| {
            if !target.is_finite()
                || target < 0.0
                || target as usize >= n
                || row.iter().any(|v| !v.is_finite())
            {
                return 0.0;
            }
            let score = row[target as usize];
            let better = row.iter().filter(|&&v| v > score).count();
            if better < k {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    Ok(Tensor::from_array(hits.into_dyn()))
}
