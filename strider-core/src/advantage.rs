//! Credit assignment over a single trajectory.
//!
//! Every function works on the transitions of one trajectory. Values, when
//! needed, carry one extra element for the state after the last transition,
//! which is the bootstrap value of that trajectory. Callers set it to zero for
//! a trajectory that ended in a terminal state.
use crate::error::StriderError;
use anyhow::Result;

fn check_values(rewards: &[f32], values: &[f32]) -> Result<()> {
    if values.len() != rewards.len() + 1 {
        return Err(StriderError::ShapeMismatch {
            what: "state values",
            expected: rewards.len() + 1,
            actual: values.len(),
        }
        .into());
    }
    Ok(())
}

/// Discounted rewards-to-go, `G[t] = r[t] + gamma * G[t + 1]` with `G = 0`
/// past the last transition.
pub fn rewards_to_go(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut out = vec![0f32; rewards.len()];
    let mut acc = 0f32;
    for (g, &r) in out.iter_mut().zip(rewards).rev() {
        acc = r + gamma * acc;
        *g = acc;
    }
    out
}

/// One-step bootstrapped targets `r[t] + gamma * V[t + 1]`.
pub fn td_targets(rewards: &[f32], values: &[f32], gamma: f32) -> Result<Vec<f32>> {
    check_values(rewards, values)?;
    Ok(rewards
        .iter()
        .zip(&values[1..])
        .map(|(&r, &v_next)| r + gamma * v_next)
        .collect())
}

/// TD residuals `delta[t] = r[t] + gamma * V[t + 1] - V[t]`.
pub fn td_residuals(rewards: &[f32], values: &[f32], gamma: f32) -> Result<Vec<f32>> {
    Ok(td_targets(rewards, values, gamma)?
        .into_iter()
        .zip(values)
        .map(|(target, &v)| target - v)
        .collect())
}

/// Generalized advantage estimation.
///
/// `A[t] = delta[t] + gamma * lambda * A[t + 1]`, computed in a single
/// backward pass. The recursion starts from zero after the last transition.
pub fn gae(rewards: &[f32], values: &[f32], gamma: f32, lambda: f32) -> Result<Vec<f32>> {
    let deltas = td_residuals(rewards, values, gamma)?;
    let mut out = vec![0f32; deltas.len()];
    let mut acc = 0f32;
    for (a, &delta) in out.iter_mut().zip(&deltas).rev() {
        acc = delta + gamma * lambda * acc;
        *a = acc;
    }
    Ok(out)
}

/// Kullback-Leibler divergence `D_KL(p || q)`.
///
/// Terms with `p[i] <= 0` contribute nothing; `q` is floored at the smallest
/// positive `f32` so a vanishing `q[i]` gives a large but finite value.
pub fn kl_divergence(p: &[f32], q: &[f32]) -> Result<f32> {
    if p.len() != q.len() {
        return Err(StriderError::ShapeMismatch {
            what: "distributions",
            expected: p.len(),
            actual: q.len(),
        }
        .into());
    }
    Ok(p.iter()
        .zip(q)
        .filter(|(&pi, _)| pi > 0.0)
        .map(|(&pi, &qi)| pi * (pi / qi.max(f32::MIN_POSITIVE)).ln())
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_rewards_to_go() {
        assert_eq!(rewards_to_go(&[1.0, 1.0, 1.0], 0.5), vec![1.75, 1.5, 1.0]);
        assert!(rewards_to_go(&[], 0.5).is_empty());
    }

    #[test]
    fn test_gae_lambda_zero_is_td_residual() -> Result<()> {
        let rewards = [1.0, 0.0, 2.0, 1.0];
        let values = [0.5, 0.2, 0.9, 0.1, 0.0];
        let deltas = td_residuals(&rewards, &values, 0.9)?;
        let advantages = gae(&rewards, &values, 0.9, 0.0)?;
        assert_close(&advantages, &deltas);
        Ok(())
    }

    #[test]
    fn test_gae_lambda_one_is_monte_carlo() -> Result<()> {
        let rewards = [1.0, 0.0, 2.0, 1.0];
        let values = [0.5, 0.2, 0.9, 0.1, 0.0];
        let gamma = 0.9;
        let returns = rewards_to_go(&rewards, gamma);
        let expected = returns
            .iter()
            .zip(&values)
            .map(|(g, v)| g - v)
            .collect::<Vec<_>>();
        assert_close(&gae(&rewards, &values, gamma, 1.0)?, &expected);

        let near = gae(&rewards, &values, gamma, 0.9999)?;
        for (x, y) in near.iter().zip(&expected) {
            assert!((x - y).abs() < 1e-3);
        }
        Ok(())
    }

    #[test]
    fn test_td_targets() -> Result<()> {
        let targets = td_targets(&[1.0, 2.0], &[0.0, 10.0, 0.0], 0.5)?;
        assert_eq!(targets, vec![6.0, 2.0]);
        assert!(td_targets(&[1.0, 2.0], &[0.0, 10.0], 0.5).is_err());
        Ok(())
    }

    #[test]
    fn test_kl_divergence() -> Result<()> {
        assert_eq!(kl_divergence(&[0.5, 0.5], &[0.5, 0.5])?, 0.0);
        let d = kl_divergence(&[1.0, 0.0], &[0.5, 0.5])?;
        assert!((d - 2f32.ln()).abs() < 1e-6);
        assert!(kl_divergence(&[0.5, 0.5], &[1.0, 0.0])?.is_finite());
        assert!(kl_divergence(&[1.0], &[0.5, 0.5]).is_err());
        Ok(())
    }
}
