//! Math skill: expression evaluation, unit conversion, and statistics.
//!
//! Expressions are evaluated by a small tokenizer + recursive-descent
//! evaluator over plain arithmetic: `+ - * / // % **`, parentheses, unary
//! signs, a fixed set of functions (`sqrt`, `sin`, `cos`, `tan`, `log`,
//! `log10`, `log2`, `abs`, `round`, `ceil`, `floor`) and the constants
//! `pi` and `e`. Nothing else is recognized, so untrusted input can be
//! evaluated safely.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::SkillError;
use crate::model::{Params, params_from};
use crate::skill::Skill;

/// Evaluate math expressions, convert units, and compute statistics.
///
/// Actions:
/// - `evaluate`: safely evaluate an arithmetic expression
/// - `convert_units`: convert between length, weight, time and temperature
///   units
/// - `statistics`: summary measures or a single measure over a list of
///   numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct MathSkill;

impl MathSkill {
    /// Create a math skill.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn evaluate(parameters: &Params) -> Result<Params, SkillError> {
        let expression = match parameters.get("expression") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(SkillError::missing("expression")),
        };

        let result = eval_expression(&expression)?;
        Ok(params_from(json!({
            "expression": expression,
            "result": result,
        })))
    }

    fn convert_units(parameters: &Params) -> Result<Params, SkillError> {
        let value = parameters
            .get("value")
            .and_then(Value::as_f64)
            .ok_or_else(|| SkillError::missing("value"))?;
        let from_unit = required_str(parameters, "from_unit")?;
        let to_unit = required_str(parameters, "to_unit")?;

        let result = if is_temperature(from_unit) && is_temperature(to_unit) {
            convert_temperature(value, from_unit, to_unit)
        } else {
            let (from_cat, from_factor) = unit_info(from_unit)
                .ok_or_else(|| SkillError::invalid("from_unit", format!("unknown unit '{from_unit}'")))?;
            let (to_cat, to_factor) = unit_info(to_unit)
                .ok_or_else(|| SkillError::invalid("to_unit", format!("unknown unit '{to_unit}'")))?;
            if from_cat != to_cat {
                return Err(SkillError::execution(format!(
                    "incompatible units: {from_unit} ({}) and {to_unit} ({})",
                    from_cat.as_str(),
                    to_cat.as_str(),
                )));
            }
            value * from_factor / to_factor
        };

        Ok(params_from(json!({
            "value": value,
            "from_unit": from_unit,
            "to_unit": to_unit,
            "result": round6(result),
        })))
    }

    fn statistics(parameters: &Params) -> Result<Params, SkillError> {
        let numbers = parameters
            .get("numbers")
            .and_then(Value::as_array)
            .ok_or_else(|| SkillError::missing("numbers"))?;
        if numbers.is_empty() {
            return Err(SkillError::invalid("numbers", "must be a non-empty list"));
        }
        let nums: Vec<f64> = numbers
            .iter()
            .map(|n| {
                n.as_f64()
                    .ok_or_else(|| SkillError::invalid("numbers", "entries must be numbers"))
            })
            .collect::<Result<_, _>>()?;

        let operation = parameters
            .get("operation")
            .and_then(Value::as_str)
            .unwrap_or("summary");

        if operation == "summary" {
            return Ok(params_from(json!({
                "numbers": nums,
                "count": nums.len(),
                "mean": mean(&nums),
                "median": median(&nums),
                "stdev": round6(sample_variance(&nums).sqrt()),
                "variance": round6(sample_variance(&nums)),
                "min": fold_min(&nums),
                "max": fold_max(&nums),
                "sum": nums.iter().sum::<f64>(),
            })));
        }

        let result = match operation {
            "mean" => mean(&nums),
            "median" => median(&nums),
            "stdev" => sample_variance(&nums).sqrt(),
            "variance" => sample_variance(&nums),
            "min" => fold_min(&nums),
            "max" => fold_max(&nums),
            "sum" => nums.iter().sum::<f64>(),
            other => {
                return Err(SkillError::invalid(
                    "operation",
                    format!(
                        "unknown operation '{other}'; supported: summary, max, mean, median, min, stdev, sum, variance"
                    ),
                ));
            }
        };

        Ok(params_from(json!({
            "numbers": nums,
            "count": nums.len(),
            "operation": operation,
            "result": result,
        })))
    }
}

#[async_trait]
impl Skill for MathSkill {
    fn name(&self) -> &str {
        "math"
    }

    fn description(&self) -> String {
        "Evaluate math expressions, convert units, and compute statistics".to_string()
    }

    fn actions(&self) -> Vec<&'static str> {
        vec!["evaluate", "convert_units", "statistics"]
    }

    async fn process(&self, action: &str, parameters: &Params) -> Result<Params, SkillError> {
        match action {
            "evaluate" => Self::evaluate(parameters),
            "convert_units" => Self::convert_units(parameters),
            "statistics" => Self::statistics(parameters),
            other => Err(SkillError::unknown_action(other)),
        }
    }
}

fn required_str<'a>(parameters: &'a Params, name: &str) -> Result<&'a str, SkillError> {
    parameters
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SkillError::missing(name))
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

// ---------------------------------------------------------------------------
// Statistics helpers
// ---------------------------------------------------------------------------

fn mean(nums: &[f64]) -> f64 {
    nums.iter().sum::<f64>() / nums.len() as f64
}

fn median(nums: &[f64]) -> f64 {
    let mut sorted = nums.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Sample variance (n - 1 denominator); 0.0 for fewer than two values.
fn sample_variance(nums: &[f64]) -> f64 {
    if nums.len() < 2 {
        return 0.0;
    }
    let m = mean(nums);
    nums.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (nums.len() - 1) as f64
}

fn fold_min(nums: &[f64]) -> f64 {
    nums.iter().copied().fold(f64::INFINITY, f64::min)
}

fn fold_max(nums: &[f64]) -> f64 {
    nums.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

// ---------------------------------------------------------------------------
// Unit conversion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnitCategory {
    Length,
    Weight,
    Time,
}

impl UnitCategory {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Weight => "weight",
            Self::Time => "time",
        }
    }
}

/// Unit table: category and factor to the base unit (meter, gram, second).
fn unit_info(unit: &str) -> Option<(UnitCategory, f64)> {
    use UnitCategory::{Length, Time, Weight};
    let info = match unit {
        "m" => (Length, 1.0),
        "km" => (Length, 1000.0),
        "cm" => (Length, 0.01),
        "mm" => (Length, 0.001),
        "mi" => (Length, 1609.344),
        "ft" => (Length, 0.3048),
        "in" => (Length, 0.0254),
        "kg" => (Weight, 1000.0),
        "g" => (Weight, 1.0),
        "mg" => (Weight, 0.001),
        "lb" => (Weight, 453.59237),
        "oz" => (Weight, 28.349523125),
        "s" => (Time, 1.0),
        "min" => (Time, 60.0),
        "h" => (Time, 3600.0),
        "d" => (Time, 86400.0),
        _ => return None,
    };
    Some(info)
}

fn is_temperature(unit: &str) -> bool {
    matches!(unit, "C" | "F" | "K")
}

fn convert_temperature(value: f64, from_unit: &str, to_unit: &str) -> f64 {
    let celsius = match from_unit {
        "C" => value,
        "F" => (value - 32.0) * 5.0 / 9.0,
        _ => value - 273.15,
    };
    match to_unit {
        "C" => celsius,
        "F" => celsius * 9.0 / 5.0 + 32.0,
        _ => celsius + 273.15,
    }
}

// ---------------------------------------------------------------------------
// Expression evaluation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
    Comma,
}

fn invalid_expr(reason: impl Into<String>) -> SkillError {
    SkillError::invalid("expression", reason)
}

fn tokenize(expression: &str) -> Result<Vec<Token>, SkillError> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut buf = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        buf.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Optional exponent, only when digits follow.
                if matches!(chars.peek(), Some(&('e' | 'E'))) {
                    let mut ahead = chars.clone();
                    ahead.next();
                    if matches!(ahead.peek(), Some(s) if *s == '+' || *s == '-') {
                        ahead.next();
                    }
                    if matches!(ahead.peek(), Some(d) if d.is_ascii_digit()) {
                        if let Some(e) = chars.next() {
                            buf.push(e);
                        }
                        if matches!(chars.peek(), Some(s) if *s == '+' || *s == '-') {
                            if let Some(sign) = chars.next() {
                                buf.push(sign);
                            }
                        }
                        while let Some(&d) = chars.peek() {
                            if d.is_ascii_digit() {
                                buf.push(d);
                                chars.next();
                            } else {
                                break;
                            }
                        }
                    }
                }
                let value: f64 = buf
                    .parse()
                    .map_err(|_| invalid_expr(format!("malformed number '{buf}'")))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut buf = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        buf.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(buf));
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                if chars.peek() == Some(&'*') {
                    chars.next();
                    tokens.push(Token::DoubleStar);
                } else {
                    tokens.push(Token::Star);
                }
            }
            '/' => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    tokens.push(Token::DoubleSlash);
                } else {
                    tokens.push(Token::Slash);
                }
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            other => {
                return Err(invalid_expr(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

struct Evaluator {
    tokens: Vec<Token>,
    pos: usize,
}

impl Evaluator {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // expr := term (("+" | "-") term)*
    fn expr(&mut self) -> Result<f64, SkillError> {
        let mut value = self.term()?;
        loop {
            if self.eat(&Token::Plus) {
                value += self.term()?;
            } else if self.eat(&Token::Minus) {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    // term := unary (("*" | "/" | "//" | "%") unary)*
    fn term(&mut self) -> Result<f64, SkillError> {
        let mut value = self.unary()?;
        loop {
            if self.eat(&Token::Star) {
                value *= self.unary()?;
            } else if self.eat(&Token::Slash) {
                value /= self.unary()?;
            } else if self.eat(&Token::DoubleSlash) {
                value = (value / self.unary()?).floor();
            } else if self.eat(&Token::Percent) {
                // Floored modulo, consistent with floor division.
                let rhs = self.unary()?;
                value -= rhs * (value / rhs).floor();
            } else {
                return Ok(value);
            }
        }
    }

    // unary := ("+" | "-") unary | power
    fn unary(&mut self) -> Result<f64, SkillError> {
        if self.eat(&Token::Plus) {
            self.unary()
        } else if self.eat(&Token::Minus) {
            Ok(-self.unary()?)
        } else {
            self.power()
        }
    }

    // power := atom ("**" unary)?   (right-associative, binds above unary)
    fn power(&mut self) -> Result<f64, SkillError> {
        let base = self.atom()?;
        if self.eat(&Token::DoubleStar) {
            let exponent = self.unary()?;
            Ok(base.powf(exponent))
        } else {
            Ok(base)
        }
    }

    fn atom(&mut self) -> Result<f64, SkillError> {
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LParen) => {
                let value = self.expr()?;
                if self.eat(&Token::RParen) {
                    Ok(value)
                } else {
                    Err(invalid_expr("missing closing parenthesis"))
                }
            }
            Some(Token::Ident(name)) => {
                if self.eat(&Token::LParen) {
                    let args = self.arguments()?;
                    apply_function(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(token) => Err(invalid_expr(format!("unexpected token {token:?}"))),
            None => Err(invalid_expr("unexpected end of expression")),
        }
    }

    fn arguments(&mut self) -> Result<Vec<f64>, SkillError> {
        let mut args = Vec::new();
        if self.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            if self.eat(&Token::RParen) {
                return Ok(args);
            }
            return Err(invalid_expr("missing closing parenthesis"));
        }
    }
}

fn constant(name: &str) -> Result<f64, SkillError> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(invalid_expr(format!("unknown name '{name}'"))),
    }
}

fn apply_function(name: &str, args: &[f64]) -> Result<f64, SkillError> {
    let unary = |f: fn(f64) -> f64| {
        if let [x] = args {
            Ok(f(*x))
        } else {
            Err(invalid_expr(format!(
                "{name}() takes exactly one argument, got {}",
                args.len()
            )))
        }
    };

    match name {
        "sqrt" => unary(f64::sqrt),
        "sin" => unary(f64::sin),
        "cos" => unary(f64::cos),
        "tan" => unary(f64::tan),
        "log" => match args {
            [x] => Ok(x.ln()),
            [x, base] => Ok(x.log(*base)),
            _ => Err(invalid_expr("log() takes one or two arguments")),
        },
        "log10" => unary(f64::log10),
        "log2" => unary(f64::log2),
        "abs" => unary(f64::abs),
        "round" => unary(f64::round),
        "ceil" => unary(f64::ceil),
        "floor" => unary(f64::floor),
        _ => Err(invalid_expr(format!("unknown function '{name}'"))),
    }
}

fn eval_expression(expression: &str) -> Result<f64, SkillError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(invalid_expr("empty expression"));
    }
    let mut evaluator = Evaluator { tokens, pos: 0 };
    let value = evaluator.expr()?;
    if evaluator.pos != evaluator.tokens.len() {
        return Err(invalid_expr("unexpected trailing input"));
    }
    if !value.is_finite() {
        return Err(invalid_expr("evaluates to a non-finite value"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> f64 {
        eval_expression(expression).unwrap()
    }

    #[test]
    fn evaluates_basic_arithmetic() {
        assert_eq!(eval("2+2"), 4.0);
        assert_eq!(eval("2 + 3 * 4"), 14.0);
        assert_eq!(eval("(2 + 3) * 4"), 20.0);
        assert_eq!(eval("10 / 4"), 2.5);
        assert_eq!(eval("10 // 3"), 3.0);
        assert_eq!(eval("-10 // 3"), -4.0);
        assert_eq!(eval("10 % 3"), 1.0);
        assert_eq!(eval("2 ** 3"), 8.0);
        // Exponentiation is right-associative.
        assert_eq!(eval("2 ** 3 ** 2"), 512.0);
        // Unary minus binds below exponentiation.
        assert_eq!(eval("-2 ** 2"), -4.0);
        assert_eq!(eval("2 * -3"), -6.0);
        assert_eq!(eval("1e3 + 1"), 1001.0);
    }

    #[test]
    fn evaluates_functions_and_constants() {
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert_eq!(eval("abs(-3)"), 3.0);
        assert_eq!(eval("floor(2.9)"), 2.0);
        assert_eq!(eval("ceil(2.1)"), 3.0);
        assert_eq!(eval("log(100, 10)"), 2.0);
        assert!((eval("pi") - std::f64::consts::PI).abs() < 1e-12);
        assert!((eval("sin(0)")).abs() < 1e-12);
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(eval_expression("2 +").is_err());
        assert!(eval_expression("").is_err());
        assert!(eval_expression("2 2").is_err());
        assert!(eval_expression("(2 + 3").is_err());
        assert!(eval_expression("unknown(2)").is_err());
        assert!(eval_expression("x + 1").is_err());
        assert!(eval_expression("2 $ 3").is_err());
        // Division by zero is not a finite result.
        assert!(eval_expression("1 / 0").is_err());
    }

    #[tokio::test]
    async fn evaluate_action_returns_expression_and_result() {
        let skill = MathSkill::new();
        let result = skill
            .process("evaluate", &params_from(json!({"expression": "2+2"})))
            .await
            .unwrap();

        assert_eq!(result.get("expression"), Some(&json!("2+2")));
        assert_eq!(result.get("result").and_then(Value::as_f64), Some(4.0));
    }

    #[tokio::test]
    async fn evaluate_requires_an_expression() {
        let skill = MathSkill::new();
        let err = skill.process("evaluate", &Params::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::MissingParameter(_)));
    }

    #[tokio::test]
    async fn converts_length_units() {
        let skill = MathSkill::new();
        let result = skill
            .process(
                "convert_units",
                &params_from(json!({"value": 2, "from_unit": "km", "to_unit": "m"})),
            )
            .await
            .unwrap();
        assert_eq!(result.get("result").and_then(Value::as_f64), Some(2000.0));

        let result = skill
            .process(
                "convert_units",
                &params_from(json!({"value": 1, "from_unit": "mi", "to_unit": "km"})),
            )
            .await
            .unwrap();
        assert_eq!(result.get("result").and_then(Value::as_f64), Some(1.609344));
    }

    #[tokio::test]
    async fn converts_temperatures() {
        let skill = MathSkill::new();
        let result = skill
            .process(
                "convert_units",
                &params_from(json!({"value": 100, "from_unit": "C", "to_unit": "F"})),
            )
            .await
            .unwrap();
        assert_eq!(result.get("result").and_then(Value::as_f64), Some(212.0));

        let result = skill
            .process(
                "convert_units",
                &params_from(json!({"value": 0, "from_unit": "C", "to_unit": "K"})),
            )
            .await
            .unwrap();
        assert_eq!(result.get("result").and_then(Value::as_f64), Some(273.15));
    }

    #[tokio::test]
    async fn rejects_incompatible_and_unknown_units() {
        let skill = MathSkill::new();

        let err = skill
            .process(
                "convert_units",
                &params_from(json!({"value": 1, "from_unit": "km", "to_unit": "kg"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::Execution(_)));

        let err = skill
            .process(
                "convert_units",
                &params_from(json!({"value": 1, "from_unit": "furlong", "to_unit": "m"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn statistics_summary() {
        let skill = MathSkill::new();
        let result = skill
            .process(
                "statistics",
                &params_from(json!({"numbers": [1, 2, 3, 4, 5]})),
            )
            .await
            .unwrap();

        assert_eq!(result.get("count"), Some(&json!(5)));
        assert_eq!(result.get("mean").and_then(Value::as_f64), Some(3.0));
        assert_eq!(result.get("median").and_then(Value::as_f64), Some(3.0));
        assert_eq!(result.get("sum").and_then(Value::as_f64), Some(15.0));
        assert_eq!(result.get("min").and_then(Value::as_f64), Some(1.0));
        assert_eq!(result.get("max").and_then(Value::as_f64), Some(5.0));
        assert_eq!(
            result.get("stdev").and_then(Value::as_f64),
            Some(1.581139)
        );
    }

    #[tokio::test]
    async fn statistics_single_operation() {
        let skill = MathSkill::new();
        let result = skill
            .process(
                "statistics",
                &params_from(json!({"numbers": [2, 4, 6], "operation": "mean"})),
            )
            .await
            .unwrap();

        assert_eq!(result.get("operation"), Some(&json!("mean")));
        assert_eq!(result.get("result").and_then(Value::as_f64), Some(4.0));
    }

    #[tokio::test]
    async fn statistics_median_of_even_count() {
        let skill = MathSkill::new();
        let result = skill
            .process(
                "statistics",
                &params_from(json!({"numbers": [4, 1, 3, 2], "operation": "median"})),
            )
            .await
            .unwrap();
        assert_eq!(result.get("result").and_then(Value::as_f64), Some(2.5));
    }

    #[tokio::test]
    async fn statistics_rejects_bad_input() {
        let skill = MathSkill::new();

        let err = skill.process("statistics", &Params::new()).await.unwrap_err();
        assert!(matches!(err, SkillError::MissingParameter(_)));

        let err = skill
            .process("statistics", &params_from(json!({"numbers": []})))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidParameter { .. }));

        let err = skill
            .process(
                "statistics",
                &params_from(json!({"numbers": [1, 2], "operation": "mode"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::InvalidParameter { .. }));
    }

    #[tokio::test]
    async fn unknown_action_is_rejected() {
        let skill = MathSkill::new();
        let err = skill
            .process("integrate", &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::UnknownAction(_)));
    }
}
