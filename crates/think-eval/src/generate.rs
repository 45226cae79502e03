//! The code-generation boundary behind the `think` keyword.

use crate::value::Value;

/// An external collaborator that turns a prompt value into source text.
///
/// The evaluator calls [`generate`](CodeGenerator::generate) with the
/// evaluated `think` operand and re-submits whatever text comes back
/// through the normal `run` pipeline; that result becomes the `think`
/// expression's value. The core never contains generation logic itself
/// — embedders install an implementation with
/// [`Interpreter::set_generator`](crate::Interpreter::set_generator).
pub trait CodeGenerator {
    /// Produce ThinkLang source for the given prompt.
    ///
    /// The error string is reported as a runtime error at the `think`
    /// site.
    fn generate(&mut self, prompt: &Value) -> Result<String, String>;
}
