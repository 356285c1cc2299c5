use crate::context::Context;
use crate::quince::{Policy, Quince8};

/// Step-by-step construction of a machine.
///
/// Context and program are mandatory; the unknown-opcode policy
/// defaults to [`Policy::Fatal`].
pub struct Builder<'a, C: Context> {
    context: Option<C>,
    program: Option<&'a [u8]>,
    policy: Policy,
}

impl<'a, C: Context> Builder<'a, C> {
    pub fn new() -> Self {
        Self {
            context: None,
            program: None,
            policy: Policy::Fatal,
        }
    }

    pub fn with_context(mut self, ctx: C) -> Self {
        self.context = Some(ctx);
        self
    }

    pub fn with_program(mut self, prog: &'a [u8]) -> Self {
        self.program = Some(prog);
        self
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Result<Quince8<C>, &'static str> {
        let context = self.context.ok_or("Context not provided")?;
        let program = self.program.ok_or("Program not provided")?;
        let mut chip = Quince8::load(context, program);
        chip.set_policy(self.policy);
        Ok(chip)
    }
}

impl<'a, C: Context> Default for Builder<'a, C> {
    fn default() -> Self {
        Self::new()
    }
}
