//! Property-based gradient checks: analytical gradients from the engine
//! against central finite differences of the forward computation.

use proptest::prelude::*;
use taper_autograd::Var;

/// Central finite difference of a scalar-valued function of a vector.
fn finite_difference<F>(f: F, x: &[f32], eps: f32) -> Vec<f32>
where
    F: Fn(&[f32]) -> f32,
{
    let mut grad = vec![0.0; x.len()];
    let mut probe = x.to_vec();
    for i in 0..x.len() {
        probe[i] = x[i] + eps;
        let plus = f(&probe);
        probe[i] = x[i] - eps;
        let minus = f(&probe);
        probe[i] = x[i];
        grad[i] = (plus - minus) / (2.0 * eps);
    }
    grad
}

fn forward_sum<F>(build: F, x: &[f32]) -> f32
where
    F: Fn(&Var) -> Var,
{
    let v = Var::from_f32(x, &[x.len()]);
    let out = build(&v).sum().expect("sum failed");
    out.value().get_f32(0).expect("scalar")
}

fn analytical_grad<F>(build: F, x: &[f32]) -> Vec<f32>
where
    F: Fn(&Var) -> Var,
{
    let v = Var::from_f32(x, &[x.len()]);
    v.requires_grad_(true);
    let out = build(&v).sum().expect("sum failed");
    out.backward().expect("backward failed");
    v.grad()
        .expect("gradient should be available")
        .as_f32_slice()
        .expect("f32 data")
        .to_vec()
}

fn check_gradient<F>(build: F, x: &[f32], tol: f32) -> Result<(), TestCaseError>
where
    F: Fn(&Var) -> Var,
{
    let analytical = analytical_grad(&build, x);
    let numerical = finite_difference(|p| forward_sum(&build, p), x, 1e-3);
    for i in 0..x.len() {
        let diff = (analytical[i] - numerical[i]).abs();
        prop_assert!(
            diff < tol,
            "gradient mismatch at index {}: x={}, analytical={}, numerical={}, diff={}",
            i,
            x[i],
            analytical[i],
            numerical[i],
            diff
        );
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_add_gradient_check(
        xy in prop::collection::vec((-10.0f32..10.0, -10.0f32..10.0), 2..20)
    ) {
        let (x, y): (Vec<f32>, Vec<f32>) = xy.into_iter().unzip();
        let rhs = y.clone();
        check_gradient(
            move |v| {
                let c = Var::from_f32(&rhs, &[rhs.len()]);
                v.add(&c).expect("add failed")
            },
            &x,
            0.1,
        )?;
    }

    #[test]
    fn prop_mul_gradient_check(
        xy in prop::collection::vec((-5.0f32..5.0, -5.0f32..5.0), 2..20)
    ) {
        let (x, y): (Vec<f32>, Vec<f32>) = xy.into_iter().unzip();
        let rhs = y.clone();
        check_gradient(
            move |v| {
                let c = Var::from_f32(&rhs, &[rhs.len()]);
                v.mul(&c).expect("mul failed")
            },
            &x,
            0.1,
        )?;
    }

    #[test]
    fn prop_div_gradient_check(
        xy in prop::collection::vec((-5.0f32..5.0, 0.5f32..5.0), 2..20)
    ) {
        let (x, y): (Vec<f32>, Vec<f32>) = xy.into_iter().unzip();
        let rhs = y.clone();
        check_gradient(
            move |v| {
                let c = Var::from_f32(&rhs, &[rhs.len()]);
                v.div(&c).expect("div failed")
            },
            &x,
            0.1,
        )?;
    }

    #[test]
    fn prop_exp_gradient_check(
        x in prop::collection::vec(-3.0f32..3.0, 2..20)
    ) {
        check_gradient(|v| v.exp().expect("exp failed"), &x, 0.1)?;
    }

    #[test]
    fn prop_log_gradient_check(
        x in prop::collection::vec(0.5f32..10.0, 2..20)
    ) {
        check_gradient(|v| v.log().expect("log failed"), &x, 0.1)?;
    }

    #[test]
    fn prop_square_gradient_check(
        x in prop::collection::vec(-5.0f32..5.0, 2..20)
    ) {
        check_gradient(|v| v.powf(2.0).expect("pow failed"), &x, 0.1)?;
    }

    #[test]
    fn prop_mean_gradient_check(
        x in prop::collection::vec(-10.0f32..10.0, 2..20)
    ) {
        // mean then a square keeps the composite nonlinear enough to
        // catch a wrong 1/n factor
        check_gradient(
            |v| {
                let m = v.mean().expect("mean failed");
                m.mul(&m).expect("mul failed")
            },
            &x,
            0.1,
        )?;
    }

    #[test]
    fn prop_composite_gradient_check(
        x in prop::collection::vec(-2.0f32..2.0, 2..12)
    ) {
        // 3 * (x + 2)^2, the canonical smoke chain
        check_gradient(
            |v| {
                let y = v.add_scalar(2.0).expect("add failed");
                y.mul(&y).expect("mul failed").mul_scalar(3.0).expect("mul failed")
            },
            &x,
            0.1,
        )?;
    }
}
