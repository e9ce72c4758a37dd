//! Conversion of infix token sequences to postfix (Reverse Polish) order
//! using the [shunting-yard](https://en.wikipedia.org/wiki/Shunting_yard_algorithm)
//! algorithm.

use super::{
    token::{Associativity, Operator, Token},
    ParseError,
};

/// Reorders tokens into postfix order. Parentheses do not appear in the
/// output.
///
/// Operators of higher precedence are emitted first. Operators of equal
/// precedence are emitted in source order when left-associative.
///
/// ```rust
/// use optimex::expr::{to_postfix, tokenize};
///
/// let postfix = to_postfix(tokenize("2+3*4").unwrap()).unwrap();
/// let rendered: Vec<String> = postfix.iter().map(ToString::to_string).collect();
/// assert_eq!(rendered, ["2", "3", "4", "*", "+"]);
/// ```
pub fn to_postfix<I>(tokens: I) -> Result<Vec<Token>, ParseError>
where
    I: IntoIterator<Item = Token>,
{
    shunting_yard(tokens, Operator::associativity)
}

fn shunting_yard<I, A>(tokens: I, associativity: A) -> Result<Vec<Token>, ParseError>
where
    I: IntoIterator<Item = Token>,
    A: Fn(&Operator) -> Associativity,
{
    let mut output = Vec::new();
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Number(_) | Token::Variable(_) => output.push(token),
            Token::LeftParen => stack.push(token),
            Token::RightParen => loop {
                match stack.pop() {
                    Some(Token::LeftParen) => break,
                    Some(op) => output.push(op),
                    None => return Err(ParseError::UnbalancedParentheses),
                }
            },
            Token::Operator(op) => {
                while let Some(Token::Operator(top)) = stack.last() {
                    if !yields_to(op, *top, associativity(&op)) {
                        break;
                    }
                    output.extend(stack.pop());
                }
                stack.push(token);
            }
        }
    }

    while let Some(token) = stack.pop() {
        if token == Token::LeftParen {
            return Err(ParseError::UnbalancedParentheses);
        }
        output.push(token);
    }

    Ok(output)
}

/// Whether the operator on top of the stack must be emitted before `incoming`
/// is pushed.
fn yields_to(incoming: Operator, top: Operator, associativity: Associativity) -> bool {
    match associativity {
        Associativity::Left => top.precedence() >= incoming.precedence(),
        Associativity::Right => top.precedence() > incoming.precedence(),
    }
}

#[derive(Debug, Clone, Copy)]
enum Previous {
    Start,
    Operand,
    Operator(Operator),
    LeftParen,
}

/// Checks the infix sequence so that every operator sits between two
/// operands and no two operands are adjacent. Parentheses must be balanced.
pub(crate) fn check_arity(tokens: &[Token]) -> Result<(), ParseError> {
    let mut previous = Previous::Start;

    for token in tokens {
        previous = match (token, previous) {
            (Token::Number(_) | Token::Variable(_) | Token::LeftParen, Previous::Operand) => {
                return Err(ParseError::MissingOperator);
            }
            (Token::Number(_) | Token::Variable(_), _) => Previous::Operand,
            (Token::LeftParen, _) => Previous::LeftParen,
            (Token::Operator(op), Previous::Operand) => Previous::Operator(*op),
            (Token::Operator(op), _) => return Err(ParseError::MissingOperand(*op)),
            (Token::RightParen, Previous::Operand) => Previous::Operand,
            (Token::RightParen, Previous::Operator(op)) => {
                return Err(ParseError::MissingOperand(op));
            }
            (Token::RightParen, Previous::Start | Previous::LeftParen) => {
                return Err(ParseError::EmptyExpression);
            }
        };
    }

    match previous {
        Previous::Operand => Ok(()),
        Previous::Operator(op) => Err(ParseError::MissingOperand(op)),
        Previous::Start | Previous::LeftParen => Err(ParseError::EmptyExpression),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::expr::tokenize;

    fn rpn(text: &str) -> Result<String, ParseError> {
        let postfix = to_postfix(tokenize(text)?)?;
        Ok(postfix
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" "))
    }

    #[test]
    fn precedence() {
        assert_eq!(rpn("2+3*4").unwrap(), "2 3 4 * +");
        assert_eq!(rpn("2*3+4").unwrap(), "2 3 * 4 +");
        assert_eq!(rpn("x1+x2^2*3").unwrap(), "x1 x2 2 ^ 3 * +");
    }

    #[test]
    fn left_associativity() {
        assert_eq!(rpn("x1-x2-x3").unwrap(), "x1 x2 - x3 -");
        assert_eq!(rpn("x1/x2*x3").unwrap(), "x1 x2 / x3 *");
        assert_eq!(rpn("2^3^2").unwrap(), "2 3 ^ 2 ^");
    }

    #[test]
    fn parentheses() {
        assert_eq!(rpn("x1*(x2+3)^2").unwrap(), "x1 x2 3 + 2 ^ *");
        assert_eq!(rpn("((x1))").unwrap(), "x1");
        assert_eq!(rpn("2^(3^2)").unwrap(), "2 3 2 ^ ^");
    }

    #[test]
    fn unbalanced() {
        for text in ["x1+(x2", "x1+x2)", ")x1(", "((x1)", "(x1))"] {
            assert_eq!(rpn(text), Err(ParseError::UnbalancedParentheses), "{}", text);
        }
    }

    #[test]
    fn stack_yielding() {
        let left = Associativity::Left;

        assert!(yields_to(Operator::Add, Operator::Sub, left));
        assert!(yields_to(Operator::Add, Operator::Mul, left));
        assert!(!yields_to(Operator::Mul, Operator::Add, left));
        assert!(!yields_to(Operator::Pow, Operator::Div, left));
        assert!(yields_to(Operator::Pow, Operator::Pow, left));
        assert!(!yields_to(Operator::Pow, Operator::Pow, Associativity::Right));
    }

    #[test]
    fn right_associative_exponent() {
        let associativity = |op: &Operator| match op {
            Operator::Pow => Associativity::Right,
            _ => Associativity::Left,
        };
        let render = |text: &str| {
            shunting_yard(tokenize(text).unwrap(), associativity)
                .unwrap()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        };

        assert_eq!(render("2^3^2"), "2 3 2 ^ ^");
        assert_eq!(render("x1-x2-x3"), "x1 x2 - x3 -");
        assert_eq!(render("x1*x2^x3^2"), "x1 x2 x3 2 ^ ^ *");
    }

    #[test]
    fn arity() {
        let check = |text: &str| check_arity(&tokenize(text).unwrap());

        assert_eq!(check("x1+x2"), Ok(()));
        assert_eq!(check("(x1)*((x2)+3)"), Ok(()));
        assert_eq!(check("-x1"), Err(ParseError::MissingOperand(Operator::Sub)));
        assert_eq!(check("x1*"), Err(ParseError::MissingOperand(Operator::Mul)));
        assert_eq!(check("x1+*x2"), Err(ParseError::MissingOperand(Operator::Mul)));
        assert_eq!(check("(+x2)"), Err(ParseError::MissingOperand(Operator::Add)));
        assert_eq!(check("(x1-)"), Err(ParseError::MissingOperand(Operator::Sub)));
        assert_eq!(check("(x1)(x2)"), Err(ParseError::MissingOperator));
        assert_eq!(check("x1(+x2)"), Err(ParseError::MissingOperator));
        assert_eq!(check("x1+x2(*3)"), Err(ParseError::MissingOperator));
        assert_eq!(check("(x1)2"), Err(ParseError::MissingOperator));
        assert_eq!(check("()"), Err(ParseError::EmptyExpression));
        assert_eq!(check("x1*()"), Err(ParseError::EmptyExpression));
        assert_eq!(check(""), Err(ParseError::EmptyExpression));
    }
}
