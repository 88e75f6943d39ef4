/// Instruction sent alongside every image.
pub const SOLUTION_INSTRUCTION: &str = include_str!("../data/prompts/solution.txt");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_is_non_empty() {
        assert!(!SOLUTION_INSTRUCTION.trim().is_empty());
    }

    #[test]
    fn test_instruction_asks_for_html() {
        assert!(SOLUTION_INSTRUCTION.contains("HTML"));
        assert!(SOLUTION_INSTRUCTION.contains("step-by-step"));
    }
}
