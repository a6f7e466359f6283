use single_utilities::traits::FloatOps;

pub mod correction;
pub mod inference;

#[derive(Debug, Clone)]
pub struct TestResult<T> {
    /// The test statistic value
    pub statistic: T,
    /// The p-value of the test
    pub p_value: T,
    /// Standard error of the difference tested
    pub standard_error: Option<T>,
}

impl<T> TestResult<T>
where
    T: FloatOps,
{
    /// Create a new test result with minimal information
    pub fn new(statistic: T, p_value: T) -> Self {
        TestResult {
            statistic,
            p_value,
            standard_error: None,
        }
    }

    /// Add standard error to the result
    pub fn with_standard_error(mut self, se: T) -> Self {
        self.standard_error = Some(se);
        self
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: T) -> bool {
        self.p_value < alpha
    }
}
