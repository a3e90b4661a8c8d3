/// Which controller of the generation is active and how many have been
/// tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerCursor {
    current: usize,
    evaluated: usize,
    size: usize,
}

/// Outcome of moving the cursor on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSwitch {
    pub from: usize,
    pub to: usize,
    pub evaluated: usize,
}

impl ControllerCursor {
    /// Starts at controller 0. `size` is clamped to at least 1.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            current: 0,
            evaluated: 0,
            size: size.max(1),
        }
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.evaluated
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Marks the active controller as tried and moves to the next one.
    pub fn advance(&mut self) -> ControllerSwitch {
        let from = self.current;
        self.evaluated += 1;
        self.current = (self.current + 1) % self.size;
        ControllerSwitch {
            from,
            to: self.current,
            evaluated: self.evaluated,
        }
    }

    #[must_use]
    pub fn generation_complete(&self) -> bool {
        self.evaluated >= self.size
    }

    /// Starts counting a new generation of `size` controllers.
    pub fn start_generation(&mut self, size: usize) {
        self.size = size.max(1);
        self.evaluated = 0;
        self.current %= self.size;
    }
}
