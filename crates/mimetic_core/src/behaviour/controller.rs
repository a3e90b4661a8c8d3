use super::scaling::squash;
use crate::program::{run_program, Interpreter};
use mimetic_data::Vec2;

/// Runs a controller and turns its first two outputs into a bounded velocity.
/// Missing outputs count as 0.
pub fn run_controller<I: Interpreter>(
    interpreter: &mut I,
    genome: &I::Genome,
    inputs: &[f64],
) -> Vec2 {
    let outputs = run_program(interpreter, genome, inputs);
    let component = |i: usize| squash(outputs.get(i).copied().unwrap_or(0.0));
    Vec2::new(component(0), component(1))
}

/// Runs an objective program on a controller's inputs and chosen velocity,
/// returning its verdict in `(-1, 1)`.
pub fn run_objective<I: Interpreter>(
    interpreter: &mut I,
    genome: &I::Genome,
    inputs: &[f64],
    velocity: Vec2,
) -> f64 {
    let mut extended = Vec::with_capacity(inputs.len() + 2);
    extended.extend_from_slice(inputs);
    extended.push(velocity.x);
    extended.push(velocity.y);
    let outputs = run_program(interpreter, genome, &extended);
    squash(outputs.first().copied().unwrap_or(0.0))
}
