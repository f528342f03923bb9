use serde::Serialize;

/// Token kinds produced by the scanner.
///
/// Contextual keywords (`var`, `module`, `requires`, `exports`, `record`,
/// `yield`, ...) are scanned as `Identifier`; the parser checks their text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum SyntaxKind {
    Unknown,
    EndOfFile,

    // Names and literals
    Identifier,
    IntLiteral,
    LongLiteral,
    FloatLiteral,
    DoubleLiteral,
    CharLiteral,
    StringLiteral,
    TextBlock,

    // Keywords
    AbstractKeyword,
    AssertKeyword,
    BooleanKeyword,
    BreakKeyword,
    ByteKeyword,
    CaseKeyword,
    CatchKeyword,
    CharKeyword,
    ClassKeyword,
    ConstKeyword,
    ContinueKeyword,
    DefaultKeyword,
    DoKeyword,
    DoubleKeyword,
    ElseKeyword,
    EnumKeyword,
    ExtendsKeyword,
    FinalKeyword,
    FinallyKeyword,
    FloatKeyword,
    ForKeyword,
    GotoKeyword,
    IfKeyword,
    ImplementsKeyword,
    ImportKeyword,
    InstanceofKeyword,
    IntKeyword,
    InterfaceKeyword,
    LongKeyword,
    NativeKeyword,
    NewKeyword,
    PackageKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    PublicKeyword,
    ReturnKeyword,
    ShortKeyword,
    StaticKeyword,
    StrictfpKeyword,
    SuperKeyword,
    SwitchKeyword,
    SynchronizedKeyword,
    ThisKeyword,
    ThrowKeyword,
    ThrowsKeyword,
    TransientKeyword,
    TryKeyword,
    VoidKeyword,
    VolatileKeyword,
    WhileKeyword,
    TrueKeyword,
    FalseKeyword,
    NullKeyword,

    // Punctuation
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    At,
    ColonColon,
    Question,
    Colon,
    Arrow,

    // Operators
    Eq,
    EqEq,
    Bang,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    AmpAmp,
    Bar,
    BarBar,
    Caret,
    Tilde,
    PlusPlus,
    MinusMinus,
    LtLt,
    GtGt,
    GtGtGt,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    BarEq,
    CaretEq,
    LtLtEq,
    GtGtEq,
    GtGtGtEq,
}

impl SyntaxKind {
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            SyntaxKind::IntLiteral
                | SyntaxKind::LongLiteral
                | SyntaxKind::FloatLiteral
                | SyntaxKind::DoubleLiteral
                | SyntaxKind::CharLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::TextBlock
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::NullKeyword
        )
    }

    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            SyntaxKind::BooleanKeyword
                | SyntaxKind::ByteKeyword
                | SyntaxKind::CharKeyword
                | SyntaxKind::ShortKeyword
                | SyntaxKind::IntKeyword
                | SyntaxKind::LongKeyword
                | SyntaxKind::FloatKeyword
                | SyntaxKind::DoubleKeyword
        )
    }

    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            SyntaxKind::PublicKeyword
                | SyntaxKind::ProtectedKeyword
                | SyntaxKind::PrivateKeyword
                | SyntaxKind::StaticKeyword
                | SyntaxKind::AbstractKeyword
                | SyntaxKind::FinalKeyword
                | SyntaxKind::NativeKeyword
                | SyntaxKind::SynchronizedKeyword
                | SyntaxKind::TransientKeyword
                | SyntaxKind::VolatileKeyword
                | SyntaxKind::StrictfpKeyword
                | SyntaxKind::DefaultKeyword
        )
    }

    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            SyntaxKind::Eq
                | SyntaxKind::PlusEq
                | SyntaxKind::MinusEq
                | SyntaxKind::StarEq
                | SyntaxKind::SlashEq
                | SyntaxKind::PercentEq
                | SyntaxKind::AmpEq
                | SyntaxKind::BarEq
                | SyntaxKind::CaretEq
                | SyntaxKind::LtLtEq
                | SyntaxKind::GtGtEq
                | SyntaxKind::GtGtGtEq
        )
    }

    /// Source text of a punctuation, operator or keyword token.
    pub fn text(self) -> &'static str {
        match self {
            SyntaxKind::OpenParen => "(",
            SyntaxKind::CloseParen => ")",
            SyntaxKind::OpenBrace => "{",
            SyntaxKind::CloseBrace => "}",
            SyntaxKind::OpenBracket => "[",
            SyntaxKind::CloseBracket => "]",
            SyntaxKind::Semicolon => ";",
            SyntaxKind::Comma => ",",
            SyntaxKind::Dot => ".",
            SyntaxKind::Ellipsis => "...",
            SyntaxKind::At => "@",
            SyntaxKind::ColonColon => "::",
            SyntaxKind::Question => "?",
            SyntaxKind::Colon => ":",
            SyntaxKind::Arrow => "->",
            SyntaxKind::Eq => "=",
            SyntaxKind::EqEq => "==",
            SyntaxKind::Bang => "!",
            SyntaxKind::BangEq => "!=",
            SyntaxKind::Lt => "<",
            SyntaxKind::LtEq => "<=",
            SyntaxKind::Gt => ">",
            SyntaxKind::GtEq => ">=",
            SyntaxKind::Plus => "+",
            SyntaxKind::Minus => "-",
            SyntaxKind::Star => "*",
            SyntaxKind::Slash => "/",
            SyntaxKind::Percent => "%",
            SyntaxKind::Amp => "&",
            SyntaxKind::AmpAmp => "&&",
            SyntaxKind::Bar => "|",
            SyntaxKind::BarBar => "||",
            SyntaxKind::Caret => "^",
            SyntaxKind::Tilde => "~",
            SyntaxKind::PlusPlus => "++",
            SyntaxKind::MinusMinus => "--",
            SyntaxKind::LtLt => "<<",
            SyntaxKind::GtGt => ">>",
            SyntaxKind::GtGtGt => ">>>",
            SyntaxKind::PlusEq => "+=",
            SyntaxKind::MinusEq => "-=",
            SyntaxKind::StarEq => "*=",
            SyntaxKind::SlashEq => "/=",
            SyntaxKind::PercentEq => "%=",
            SyntaxKind::AmpEq => "&=",
            SyntaxKind::BarEq => "|=",
            SyntaxKind::CaretEq => "^=",
            SyntaxKind::LtLtEq => "<<=",
            SyntaxKind::GtGtEq => ">>=",
            SyntaxKind::GtGtGtEq => ">>>=",
            SyntaxKind::Identifier => "<identifier>",
            SyntaxKind::EndOfFile => "<EOF>",
            other => KEYWORDS
                .iter()
                .find(|(_, kind)| *kind == other)
                .map(|(text, _)| *text)
                .unwrap_or("<token>"),
        }
    }
}

const KEYWORDS: &[(&str, SyntaxKind)] = &[
    ("abstract", SyntaxKind::AbstractKeyword),
    ("assert", SyntaxKind::AssertKeyword),
    ("boolean", SyntaxKind::BooleanKeyword),
    ("break", SyntaxKind::BreakKeyword),
    ("byte", SyntaxKind::ByteKeyword),
    ("case", SyntaxKind::CaseKeyword),
    ("catch", SyntaxKind::CatchKeyword),
    ("char", SyntaxKind::CharKeyword),
    ("class", SyntaxKind::ClassKeyword),
    ("const", SyntaxKind::ConstKeyword),
    ("continue", SyntaxKind::ContinueKeyword),
    ("default", SyntaxKind::DefaultKeyword),
    ("do", SyntaxKind::DoKeyword),
    ("double", SyntaxKind::DoubleKeyword),
    ("else", SyntaxKind::ElseKeyword),
    ("enum", SyntaxKind::EnumKeyword),
    ("extends", SyntaxKind::ExtendsKeyword),
    ("final", SyntaxKind::FinalKeyword),
    ("finally", SyntaxKind::FinallyKeyword),
    ("float", SyntaxKind::FloatKeyword),
    ("for", SyntaxKind::ForKeyword),
    ("goto", SyntaxKind::GotoKeyword),
    ("if", SyntaxKind::IfKeyword),
    ("implements", SyntaxKind::ImplementsKeyword),
    ("import", SyntaxKind::ImportKeyword),
    ("instanceof", SyntaxKind::InstanceofKeyword),
    ("int", SyntaxKind::IntKeyword),
    ("interface", SyntaxKind::InterfaceKeyword),
    ("long", SyntaxKind::LongKeyword),
    ("native", SyntaxKind::NativeKeyword),
    ("new", SyntaxKind::NewKeyword),
    ("package", SyntaxKind::PackageKeyword),
    ("private", SyntaxKind::PrivateKeyword),
    ("protected", SyntaxKind::ProtectedKeyword),
    ("public", SyntaxKind::PublicKeyword),
    ("return", SyntaxKind::ReturnKeyword),
    ("short", SyntaxKind::ShortKeyword),
    ("static", SyntaxKind::StaticKeyword),
    ("strictfp", SyntaxKind::StrictfpKeyword),
    ("super", SyntaxKind::SuperKeyword),
    ("switch", SyntaxKind::SwitchKeyword),
    ("synchronized", SyntaxKind::SynchronizedKeyword),
    ("this", SyntaxKind::ThisKeyword),
    ("throw", SyntaxKind::ThrowKeyword),
    ("throws", SyntaxKind::ThrowsKeyword),
    ("transient", SyntaxKind::TransientKeyword),
    ("try", SyntaxKind::TryKeyword),
    ("void", SyntaxKind::VoidKeyword),
    ("volatile", SyntaxKind::VolatileKeyword),
    ("while", SyntaxKind::WhileKeyword),
    ("true", SyntaxKind::TrueKeyword),
    ("false", SyntaxKind::FalseKeyword),
    ("null", SyntaxKind::NullKeyword),
];

/// Map reserved words to their keyword kind.
pub fn keyword_kind(text: &str) -> Option<SyntaxKind> {
    KEYWORDS
        .iter()
        .find(|(word, _)| *word == text)
        .map(|(_, kind)| *kind)
}
