use super::Chip8Error;

/// Levels of subroutine nesting.
pub const STACK_CAPACITY: usize = 16;

/// Fixed-capacity stack of return addresses used by `2nnn` and `00EE`.
#[derive(Debug, Clone)]
pub struct CallStack {
    slots: [u16; STACK_CAPACITY],
    depth: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self {
            slots: [0; STACK_CAPACITY],
            depth: 0,
        }
    }

    /// Pushes a return address. Fails without modifying the stack when it is full.
    pub fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        let slot = self
            .slots
            .get_mut(self.depth)
            .ok_or(Chip8Error::StackOverflow {
                capacity: STACK_CAPACITY,
            })?;
        *slot = addr;
        self.depth += 1;
        Ok(())
    }

    /// Pops the most recent return address.
    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        self.depth = self.depth.checked_sub(1).ok_or(Chip8Error::StackUnderflow)?;
        Ok(self.slots[self.depth])
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Return addresses from the bottom of the stack to the top.
    pub fn frames(&self) -> &[u16] {
        &self.slots[..self.depth]
    }

    pub fn clear(&mut self) {
        self.slots.fill(0);
        self.depth = 0;
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = CallStack::new();
        stack.push(0x202).unwrap();
        stack.push(0x304).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.frames(), &[0x202, 0x304]);

        assert_eq!(stack.pop().unwrap(), 0x304);
        assert_eq!(stack.pop().unwrap(), 0x202);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_overflow_leaves_stack_intact() {
        let mut stack = CallStack::new();
        for i in 0..STACK_CAPACITY {
            stack.push(i as u16).unwrap();
        }

        let err = stack.push(0xABC).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::StackOverflow {
                capacity: STACK_CAPACITY
            }
        ));
        assert_eq!(stack.depth(), STACK_CAPACITY);
        assert_eq!(stack.pop().unwrap(), (STACK_CAPACITY - 1) as u16);
    }

    #[test]
    fn test_underflow() {
        let mut stack = CallStack::new();
        assert!(matches!(stack.pop(), Err(Chip8Error::StackUnderflow)));
        assert_eq!(stack.depth(), 0);
    }
}
