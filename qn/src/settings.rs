use std::io::Write;

use crate::{CELL_SIZE, DEFAULT_ARENA_SIZE, DEFAULT_ROOT_STACK_SIZE, Error, Result};

/// Cells needed to intern `t`: symbol, name chunk, binding and table pair.
pub const MIN_CELLS: usize = 4;

/// Root entries held while `t` is interned.
pub const MIN_ROOT_STACK_SIZE: usize = 4;

/// What happens once a context fails.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Return the error to the caller and close the session.
    #[default]
    Surface,
    /// Terminate the process after the diagnostic is written.
    Exit,
}

#[derive(Default)]
pub struct ContextCreateInfo {
    // arena size in bytes, zero picks the default
    pub size: usize,
    pub root_stack_size: Option<usize>,
    pub error_policy: Option<ErrorPolicy>,
    // where failure diagnostics go, stderr if unset
    pub diagnostics: Option<Box<dyn Write + Send>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextSettings {
    pub cells: usize,
    pub root_stack_size: usize,
    pub error_policy: ErrorPolicy,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            cells: DEFAULT_ARENA_SIZE / CELL_SIZE,
            root_stack_size: DEFAULT_ROOT_STACK_SIZE,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl ContextSettings {
    pub fn from_info(info: &ContextCreateInfo) -> Result<Self> {
        let mut settings = ContextSettings::default();
        if info.size != 0 {
            settings.cells = info.size / CELL_SIZE;
        }
        info.root_stack_size
            .inspect(|&val| settings.root_stack_size = val);
        info.error_policy.inspect(|&val| settings.error_policy = val);

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cells < MIN_CELLS {
            return Err(Error::InvalidSettings("arena too small to start a context"));
        }
        // u32::MAX is the nil reference
        if self.cells >= u32::MAX as usize {
            return Err(Error::InvalidSettings("arena exceeds addressable cells"));
        }
        if self.root_stack_size < MIN_ROOT_STACK_SIZE {
            return Err(Error::InvalidSettings("root stack too small to start a context"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_picks_defaults() {
        let settings = ContextSettings::from_info(&ContextCreateInfo::default()).unwrap();
        assert_eq!(settings, ContextSettings::default());
        assert_eq!(settings.cells, DEFAULT_ARENA_SIZE / CELL_SIZE);
        assert_eq!(settings.root_stack_size, 256);
        assert_eq!(settings.error_policy, ErrorPolicy::Surface);
    }

    #[test]
    fn overrides_apply() {
        let info = ContextCreateInfo {
            size: CELL_SIZE * 100 + 3,
            root_stack_size: Some(16),
            error_policy: Some(ErrorPolicy::Exit),
            ..Default::default()
        };
        let settings = ContextSettings::from_info(&info).unwrap();
        assert_eq!(settings.cells, 100);
        assert_eq!(settings.root_stack_size, 16);
        assert_eq!(settings.error_policy, ErrorPolicy::Exit);
    }

    #[test]
    fn rejects_unusable_configurations() {
        let tiny = ContextCreateInfo {
            size: CELL_SIZE - 1,
            ..Default::default()
        };
        assert!(matches!(
            ContextSettings::from_info(&tiny),
            Err(Error::InvalidSettings(_))
        ));

        let no_roots = ContextCreateInfo {
            root_stack_size: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            ContextSettings::from_info(&no_roots),
            Err(Error::InvalidSettings(_))
        ));

        for cells in 1..MIN_CELLS {
            let info = ContextCreateInfo {
                size: cells * CELL_SIZE,
                ..Default::default()
            };
            assert!(matches!(
                ContextSettings::from_info(&info),
                Err(Error::InvalidSettings(_))
            ));
        }
        for depth in 1..MIN_ROOT_STACK_SIZE {
            let info = ContextCreateInfo {
                root_stack_size: Some(depth),
                ..Default::default()
            };
            assert!(matches!(
                ContextSettings::from_info(&info),
                Err(Error::InvalidSettings(_))
            ));
        }

        let huge = ContextSettings {
            cells: u32::MAX as usize,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn minimum_configuration_starts() {
        let info = ContextCreateInfo {
            size: MIN_CELLS * CELL_SIZE,
            root_stack_size: Some(MIN_ROOT_STACK_SIZE),
            ..Default::default()
        };
        let ctx = crate::Context::new(info).unwrap();
        assert_eq!(ctx.heap().capacity(), MIN_CELLS);
        assert_eq!(ctx.roots().depth(), 0);
    }
}
