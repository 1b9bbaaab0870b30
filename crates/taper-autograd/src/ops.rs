//! Differentiable operation dispatch.
//!
//! Each operation computes its forward value through taper-core, then —
//! when tracking is enabled and at least one operand requires a gradient
//! — allocates a graph node binding the operation's backward rule to the
//! operand nodes. Otherwise the result is a plain untracked constant,
//! indistinguishable from a detached leaf.

use crate::grad_fn::{
    AddBackward, AddScalarBackward, DivBackward, ExpBackward, GradFn, LogBackward, MeanBackward,
    MulBackward, MulScalarBackward, NegBackward, PowBackward, SubBackward, SumBackward,
};
use crate::graph::Node;
use crate::scope::is_grad_enabled;
use crate::var::Var;
use crate::Result;

use taper_core::Tensor;

fn track(inputs: &[&Var]) -> bool {
    is_grad_enabled() && inputs.iter().any(|v| v.requires_grad())
}

fn binary(out: Tensor, a: &Var, b: &Var, grad_fn: Box<dyn GradFn>) -> Var {
    if track(&[a, b]) {
        Var::from_node(Node::interior(out, grad_fn, vec![a.node_arc(), b.node_arc()]))
    } else {
        Var::leaf(out, false)
    }
}

fn unary(out: Tensor, a: &Var, grad_fn: Box<dyn GradFn>) -> Var {
    if track(&[a]) {
        Var::from_node(Node::interior(out, grad_fn, vec![a.node_arc()]))
    } else {
        Var::leaf(out, false)
    }
}

impl Var {
    /// Element-wise addition with broadcasting.
    pub fn add(&self, other: &Var) -> Result<Var> {
        let out = self.value().add(other.value())?;
        let gf = AddBackward {
            lhs_dims: self.dims().to_vec(),
            rhs_dims: other.dims().to_vec(),
        };
        Ok(binary(out, self, other, Box::new(gf)))
    }

    /// Element-wise subtraction with broadcasting.
    pub fn sub(&self, other: &Var) -> Result<Var> {
        let out = self.value().sub(other.value())?;
        let gf = SubBackward {
            lhs_dims: self.dims().to_vec(),
            rhs_dims: other.dims().to_vec(),
        };
        Ok(binary(out, self, other, Box::new(gf)))
    }

    /// Element-wise multiplication with broadcasting.
    pub fn mul(&self, other: &Var) -> Result<Var> {
        let out = self.value().mul(other.value())?;
        let gf = MulBackward {
            lhs: self.value().clone(),
            rhs: other.value().clone(),
        };
        Ok(binary(out, self, other, Box::new(gf)))
    }

    /// Element-wise division with broadcasting.
    pub fn div(&self, other: &Var) -> Result<Var> {
        let out = self.value().div(other.value())?;
        let gf = DivBackward {
            lhs: self.value().clone(),
            rhs: other.value().clone(),
        };
        Ok(binary(out, self, other, Box::new(gf)))
    }

    /// Element-wise negation.
    pub fn neg(&self) -> Result<Var> {
        let out = self.value().neg()?;
        Ok(unary(out, self, Box::new(NegBackward)))
    }

    /// Element-wise exponential.
    pub fn exp(&self) -> Result<Var> {
        let out = self.value().exp()?;
        let gf = ExpBackward {
            output: out.clone(),
        };
        Ok(unary(out, self, Box::new(gf)))
    }

    /// Element-wise natural logarithm.
    pub fn log(&self) -> Result<Var> {
        let out = self.value().log()?;
        let gf = LogBackward {
            input: self.value().clone(),
        };
        Ok(unary(out, self, Box::new(gf)))
    }

    /// Element-wise power with a scalar exponent.
    pub fn powf(&self, exponent: f32) -> Result<Var> {
        let out = self.value().pow_scalar(exponent)?;
        let gf = PowBackward {
            input: self.value().clone(),
            exponent,
        };
        Ok(unary(out, self, Box::new(gf)))
    }

    /// Scalar addition.
    pub fn add_scalar(&self, scalar: f32) -> Result<Var> {
        let out = self.value().add_scalar(scalar)?;
        Ok(unary(out, self, Box::new(AddScalarBackward)))
    }

    /// Scalar multiplication.
    pub fn mul_scalar(&self, scalar: f32) -> Result<Var> {
        let out = self.value().mul_scalar(scalar)?;
        Ok(unary(out, self, Box::new(MulScalarBackward { scalar })))
    }

    /// Sum all elements to a scalar.
    pub fn sum(&self) -> Result<Var> {
        let out = self.value().sum()?;
        let gf = SumBackward {
            input_dims: self.dims().to_vec(),
        };
        Ok(unary(out, self, Box::new(gf)))
    }

    /// Mean of all elements, as a scalar.
    pub fn mean(&self) -> Result<Var> {
        let out = self.value().mean()?;
        let gf = MeanBackward {
            input_dims: self.dims().to_vec(),
        };
        Ok(unary(out, self, Box::new(gf)))
    }
}

// Operator overloads

impl std::ops::Add for &Var {
    type Output = Var;
    fn add(self, rhs: &Var) -> Var {
        Var::add(self, rhs).expect("Add failed")
    }
}

impl std::ops::Sub for &Var {
    type Output = Var;
    fn sub(self, rhs: &Var) -> Var {
        Var::sub(self, rhs).expect("Sub failed")
    }
}

impl std::ops::Mul for &Var {
    type Output = Var;
    fn mul(self, rhs: &Var) -> Var {
        Var::mul(self, rhs).expect("Mul failed")
    }
}

impl std::ops::Neg for &Var {
    type Output = Var;
    fn neg(self) -> Var {
        Var::neg(self).expect("Neg failed")
    }
}

impl std::ops::Add<f32> for &Var {
    type Output = Var;
    fn add(self, rhs: f32) -> Var {
        self.add_scalar(rhs).expect("Add failed")
    }
}

impl std::ops::Mul<f32> for &Var {
    type Output = Var;
    fn mul(self, rhs: f32) -> Var {
        self.mul_scalar(rhs).expect("Mul failed")
    }
}
