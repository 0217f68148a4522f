use serde::{Deserialize, Serialize};

/// Linear warmup from 0 to `base_lr`, then linear decay to 0 at `total_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSchedule {
    pub base_lr:      f64,
    pub warmup_steps: usize,
    pub total_steps:  usize,
}

impl LinearSchedule {
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self { base_lr, warmup_steps, total_steps }
    }

    /// Learning rate for the 0-based optimizer `step`.
    pub fn lr_at(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            return self.base_lr * (step + 1) as f64 / self.warmup_steps as f64;
        }
        let decay_steps = self.total_steps.saturating_sub(self.warmup_steps);
        if decay_steps == 0 {
            return self.base_lr;
        }
        let remaining = decay_steps.saturating_sub(step - self.warmup_steps);
        self.base_lr * remaining as f64 / decay_steps as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_without_warmup() {
        let s = LinearSchedule::new(1.0, 0, 4);
        assert_eq!(s.lr_at(0), 1.0);
        assert_eq!(s.lr_at(1), 0.75);
        assert_eq!(s.lr_at(3), 0.25);
        assert_eq!(s.lr_at(10), 0.0);
    }

    #[test]
    fn test_warmup_then_decay() {
        let s = LinearSchedule::new(1.0, 2, 6);
        assert_eq!(s.lr_at(0), 0.5);
        assert_eq!(s.lr_at(1), 1.0);
        assert_eq!(s.lr_at(2), 1.0);
        assert_eq!(s.lr_at(4), 0.5);
    }

    #[test]
    fn test_non_increasing_after_warmup() {
        let s = LinearSchedule::new(5e-5, 10, 100);
        let lrs: Vec<f64> = (10..100).map(|i| s.lr_at(i)).collect();
        assert!(lrs.windows(2).all(|w| w[1] <= w[0]));
    }
}
