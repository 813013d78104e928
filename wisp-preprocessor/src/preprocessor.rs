use std::collections::{HashMap, HashSet};

use wisp_foundation::errors::PreprocessorError;
use wisp_foundation::Diagnostics;
use wisp_lexer::{Token, TokenKind};

use crate::builtins;
use crate::conditional;
use crate::file_provider::FileProvider;

/// Rewrites a token vector in place: macro definitions and invocations,
/// conditional compilation, file inclusion, concatenation/equality
/// operators, `#error`/`#log` (§4.3).
pub struct Preprocessor<'a> {
    tokens: Vec<Token>,
    pos: usize,
    total_size: usize,
    diagnostics: &'a mut Diagnostics,
    macros: HashMap<String, Vec<Token>>,
    included_files: HashSet<String>,
    macro_depth: usize,
    max_macro_depth: usize,
    file_provider: &'a dyn FileProvider,
}

impl<'a> Preprocessor<'a> {
    pub fn new(
        tokens: Vec<Token>,
        diagnostics: &'a mut Diagnostics,
        originating_file: &str,
        file_provider: &'a dyn FileProvider,
        skip_builtins: bool,
    ) -> Self {
        let total_size = tokens.len();
        let mut included_files = HashSet::new();
        if !originating_file.is_empty() {
            included_files.insert(originating_file.to_string());
        }

        let mut macros = HashMap::new();
        if !skip_builtins {
            let file_label = if originating_file.is_empty() {
                "REPL"
            } else {
                originating_file
            };
            builtins::install(&mut macros, file_label);
        }

        Self {
            tokens,
            pos: 0,
            total_size,
            diagnostics,
            macros,
            included_files,
            macro_depth: 0,
            max_macro_depth: 32,
            file_provider,
        }
    }

    pub fn specify_max_macro_depth(&mut self, max_macro_depth: usize) {
        self.max_macro_depth = max_macro_depth;
    }

    /// Runs the dispatch loop to completion (or to the first diagnostic),
    /// then strips control tokens (§4.3.9).
    pub fn process(mut self) -> Vec<Token> {
        while self.pos < self.total_size {
            self.evaluate_token();
            if !self.diagnostics.empty() {
                return self.tokens;
            }
        }

        self.tokens.retain(|t| !t.kind.is_control());
        self.tokens
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn error(&mut self, error: PreprocessorError) {
        self.diagnostics.insert(error.to_string());
    }

    /// Marks the current token `skip` and advances, without letting the
    /// cursor run past the last token (mirrors the original's `skip()`).
    fn mark_skip_and_advance(&mut self) -> Token {
        self.tokens[self.pos].kind = TokenKind::Skip;
        if self.pos + 1 < self.total_size {
            self.pos += 1;
        }
        self.tokens[self.pos].clone()
    }

    /// Moves past an ordinary (non-directive) token, letting the cursor
    /// reach `total_size` so the dispatch loop terminates at `eof`.
    fn step_over_live_token(&mut self) {
        if self.pos + 1 < self.total_size {
            self.pos += 1;
        } else {
            self.pos = self.total_size;
        }
    }

    fn evaluate_token(&mut self) {
        let token = self.current().clone();
        let mut used_macro = false;

        match token.kind {
            TokenKind::Macro if token.lexeme == "import" => self.handle_importing(true),
            TokenKind::Macro if token.lexeme == "include" => self.handle_importing(false),
            TokenKind::Macro if token.lexeme == "def" || token.lexeme == "defl" => {
                self.handle_macro_definition()
            }
            TokenKind::Identifier if self.macros.contains_key(&token.lexeme) => {
                self.handle_using_macro();
                used_macro = true;
            }
            TokenKind::Macro if token.lexeme == "undef" => self.handle_deleting_macro(),
            TokenKind::Macro if token.lexeme == "if" => self.handle_conditional(),
            TokenKind::Macro if matches!(token.lexeme.as_str(), "elif" | "else" | "endif") => {
                self.error(PreprocessorError::InvalidMcondStart);
            }
            TokenKind::HashHash => self.handle_concatenation(),
            TokenKind::HashEquals => self.handle_equality(false),
            TokenKind::HashNotEquals => self.handle_equality(true),
            TokenKind::Macro if token.lexeme == "error" => self.handle_error_directive(),
            TokenKind::Macro if token.lexeme == "log" => self.handle_logging(true),
            TokenKind::Macro if token.lexeme == "logl" => self.handle_logging(false),
            TokenKind::Eoi => self.handle_eoi(&token),
            _ => self.step_over_live_token(),
        }

        if !used_macro {
            self.macro_depth = 0;
        }
    }

    // ---- §4.3.2 Definition -------------------------------------------------

    fn handle_macro_definition(&mut self) {
        let define_line = self.current().lexeme == "defl";
        let name_token = self.mark_skip_and_advance();

        if name_token.kind != TokenKind::Identifier {
            self.error(PreprocessorError::ExpectedIdentMacroDef);
            return;
        }
        let name = name_token.lexeme;
        if self.macros.contains_key(&name) {
            self.error(PreprocessorError::MacroExists);
            return;
        }

        let next = self.mark_skip_and_advance();
        let has_params = next.kind == TokenKind::LParen;

        if has_params {
            let after_paren = self.tokens.get(self.pos + 1).map(|t| t.kind);
            if matches!(after_paren, None | Some(TokenKind::Eof) | Some(TokenKind::RParen)) {
                self.error(PreprocessorError::InvalidMacroParams);
                return;
            }

            self.mark_skip_and_advance(); // consume '('

            let mut values = vec![Token::new(TokenKind::Newline, "separator")];
            let mut arg_count = 0usize;
            let mut variadic = false;

            loop {
                let param = self.current().clone();
                if param.kind != TokenKind::Identifier && param.kind != TokenKind::DotDotDot {
                    break;
                }
                values.push(param.clone());
                if param.kind == TokenKind::DotDotDot {
                    if variadic {
                        self.error(PreprocessorError::InvalidVariadicMacro);
                        return;
                    }
                    variadic = true;
                }
                arg_count += 1;

                let separator = self.mark_skip_and_advance();
                if separator.kind != TokenKind::Comma && separator.kind != TokenKind::RParen {
                    self.error(PreprocessorError::ExpectedCommaOrRParen);
                    return;
                }
                let was_rparen = separator.kind == TokenKind::RParen;
                self.mark_skip_and_advance();
                if was_rparen {
                    break;
                }
            }

            if variadic && values.last().map(|t| t.kind) != Some(TokenKind::DotDotDot) {
                self.error(PreprocessorError::InvalidVariadicMacro);
                return;
            }
            values.push(Token::new(TokenKind::Newline, "separator"));

            if self.current().kind != TokenKind::Equals {
                self.error(PreprocessorError::ExpectedEqualsMacroDef);
                return;
            }
            self.mark_skip_and_advance();

            let end = if define_line {
                TokenKind::Newline
            } else {
                TokenKind::Semicolon
            };
            while self.current().kind != end && self.current().kind != TokenKind::Eof {
                values.push(self.current().clone());
                self.mark_skip_and_advance();
            }

            if values.len() - 2 - arg_count == 0 {
                self.error(PreprocessorError::InvalidMacroBody);
                return;
            }
            self.macros.insert(name, values);
        } else if next.kind == TokenKind::Semicolon {
            self.mark_skip_and_advance();
            self.macros.insert(name, vec![Token::new(TokenKind::Skip, "")]);
            return;
        } else {
            if next.kind != TokenKind::Equals {
                self.error(PreprocessorError::ExpectedEqualsMacroDef);
                return;
            }
            self.mark_skip_and_advance();

            let mut values = Vec::new();
            let end = if define_line {
                TokenKind::Newline
            } else {
                TokenKind::Semicolon
            };
            while self.current().kind != end && self.current().kind != TokenKind::Eof {
                values.push(self.current().clone());
                self.mark_skip_and_advance();
            }
            if values.is_empty() {
                self.error(PreprocessorError::InvalidMacroBody);
                return;
            }
            self.macros.insert(name, values);
        }

        if !define_line {
            if self.current().kind != TokenKind::Semicolon {
                self.error(PreprocessorError::StatementSemicolon);
                return;
            }
            self.mark_skip_and_advance();
        }
    }

    fn handle_deleting_macro(&mut self) {
        let name_token = self.mark_skip_and_advance();
        if name_token.kind != TokenKind::Identifier {
            self.error(PreprocessorError::InvalidUndefine);
            return;
        }
        self.macros.remove(&name_token.lexeme);

        let terminator = self.mark_skip_and_advance();
        if terminator.kind != TokenKind::Semicolon {
            self.error(PreprocessorError::StatementSemicolon);
            return;
        }
        self.mark_skip_and_advance();
    }

    // ---- §4.3.3 Invocation --------------------------------------------------

    fn handle_using_macro(&mut self) {
        self.macro_depth += 1;
        if self.macro_depth >= self.max_macro_depth {
            self.error(PreprocessorError::InfiniteMacroLoop);
            return;
        }

        let definition = self.macros[&self.current().lexeme].clone();
        let next = self.mark_skip_and_advance();
        let has_args = next.kind == TokenKind::LParen;

        if has_args {
            let after_paren = self.tokens.get(self.pos + 1).map(|t| t.kind);
            if matches!(after_paren, None | Some(TokenKind::Eof) | Some(TokenKind::RParen)) {
                self.error(PreprocessorError::InvalidMacroCall);
                return;
            }
            self.expand_with_args(definition);
        } else {
            self.expand_without_args(definition);
        }
    }

    fn expand_without_args(&mut self, definition: Vec<Token>) {
        let first = &definition[0];
        if first.kind == TokenKind::Skip {
            self.error(PreprocessorError::CalledEmptyMacro);
            return;
        }
        if first.kind == TokenKind::Newline
            && (first.lexeme == "separator" || first.lexeme == "variadic")
        {
            self.error(PreprocessorError::InvalidArgCount);
            return;
        }

        let splice_at = self.pos;
        self.tokens.splice(splice_at..splice_at, definition);
        self.total_size = self.tokens.len();
        self.pos = splice_at;
    }

    fn expand_with_args(&mut self, mut copied: Vec<Token>) {
        self.mark_skip_and_advance(); // consume '('

        let mut params: Vec<Vec<Token>> = Vec::new();
        let mut variadic_params: Vec<Token> = Vec::new();
        let mut param_depth = 1usize;
        let mut l_index = 1usize;
        let mut variadic = false;

        loop {
            if self.pos >= self.total_size {
                break;
            }
            let mut group = Vec::new();

            let valid = l_index < copied.len();
            if valid && copied[l_index].kind == TokenKind::DotDotDot {
                variadic = true;
            } else if valid && copied[l_index].kind == TokenKind::Newline {
                l_index = copied.len();
            }
            l_index += 1;

            loop {
                let tok = self.current().clone();
                if tok.kind == TokenKind::Eof {
                    break;
                }
                if tok.kind == TokenKind::Comma && param_depth == 1 {
                    break;
                }
                if tok.kind == TokenKind::LParen {
                    param_depth += 1;
                }
                if tok.kind == TokenKind::RParen {
                    param_depth -= 1;
                    if param_depth == 0 {
                        break;
                    }
                }
                if variadic {
                    variadic_params.push(tok);
                } else {
                    group.push(tok);
                }
                self.mark_skip_and_advance();
            }
            params.push(group);

            let terminator = self.current().kind;
            if terminator != TokenKind::Comma && terminator != TokenKind::RParen {
                self.error(PreprocessorError::ExpectedCommaOrRParen);
                return;
            }
            if terminator == TokenKind::RParen {
                self.mark_skip_and_advance();
                break;
            }
            self.mark_skip_and_advance();
        }

        let mut translations: HashMap<String, usize> = HashMap::new();
        let mut param_count = 0usize;
        for i in 1..copied.len() {
            if copied[i].kind == TokenKind::Newline {
                break;
            }
            translations.insert(copied[i].lexeme.clone(), i - 1);
            copied[i].kind = TokenKind::Skip;
            param_count += 1;
        }

        let valid_arg_count = if variadic {
            param_count <= params.len()
        } else {
            param_count == params.len()
        };
        let is_parametrized = copied
            .first()
            .map(|t| t.kind == TokenKind::Newline && t.lexeme == "separator")
            .unwrap_or(false);

        if !valid_arg_count || !is_parametrized {
            self.error(PreprocessorError::InvalidArgCount);
            return;
        }

        let mut i = param_count + 2;
        while i < copied.len() {
            let kind = copied[i].kind;
            let lexeme = copied[i].lexeme.clone();
            let Some(&param_index) = translations.get(&lexeme) else {
                i += 1;
                continue;
            };

            if variadic && kind == TokenKind::DotDotDot {
                copied[i].kind = TokenKind::Skip;
                let insert_at = i + 1;
                for (offset, tok) in variadic_params.iter().cloned().enumerate() {
                    copied.insert(insert_at + offset, tok);
                }
            } else if variadic && kind == TokenKind::String && lexeme == "..." {
                copied[i].lexeme = variadic_params
                    .iter()
                    .map(|t| t.lexeme.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
            } else if kind == TokenKind::Identifier {
                copied[i].kind = TokenKind::Skip;
                let replacement = params[param_index].clone();
                let insert_at = i + 1;
                for (offset, tok) in replacement.into_iter().enumerate() {
                    copied.insert(insert_at + offset, tok);
                }
            } else if kind == TokenKind::String {
                copied[i].lexeme = params[param_index]
                    .iter()
                    .map(|t| t.lexeme.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
            }
            i += 1;
        }

        let body = copied[param_count + 2..].to_vec();
        let splice_at = self.pos;
        self.tokens.splice(splice_at..splice_at, body);
        self.total_size = self.tokens.len();
        self.pos = splice_at;
    }

    // ---- §4.3.7 Concatenation / equality -------------------------------------

    /// `##`/`#==`/`#!=` are written infix (`a ## b`); this merges the token
    /// immediately to the left with the token immediately to the right and
    /// drops both the operator and the right operand.
    fn handle_concatenation(&mut self) {
        if self.pos == 0 || self.pos + 1 >= self.total_size {
            self.error(PreprocessorError::InvalidConcatenationMacro);
            return;
        }
        let op_index = self.pos;
        let right_lexeme = self.tokens[op_index + 1].lexeme.clone();
        self.tokens[op_index - 1].kind = TokenKind::String;
        self.tokens[op_index - 1].lexeme.push_str(&right_lexeme);

        self.tokens.remove(op_index + 1);
        self.tokens.remove(op_index);
        self.total_size = self.tokens.len();
        self.pos = op_index - 1;
    }

    fn handle_equality(&mut self, negate: bool) {
        if self.pos == 0 || self.pos + 1 >= self.total_size {
            self.error(PreprocessorError::InvalidEqualityMacro);
            return;
        }
        let op_index = self.pos;
        let mut equal = self.tokens[op_index - 1].lexeme == self.tokens[op_index + 1].lexeme;
        if negate {
            equal = !equal;
        }

        self.tokens[op_index - 1].kind = TokenKind::Integer;
        self.tokens[op_index - 1].lexeme = if equal { "1".to_string() } else { "0".to_string() };

        self.tokens.remove(op_index + 1);
        self.tokens.remove(op_index);
        self.total_size = self.tokens.len();
        self.pos = op_index - 1;
    }

    // ---- §4.3.8 Error / log ---------------------------------------------------

    fn handle_error_directive(&mut self) {
        let message = self.mark_skip_and_advance();
        if message.kind != TokenKind::String {
            self.error(PreprocessorError::ExpectedStringAfterError);
            return;
        }
        let terminator = self.mark_skip_and_advance();
        if terminator.kind != TokenKind::Semicolon {
            self.error(PreprocessorError::StatementSemicolon);
            return;
        }
        self.mark_skip_and_advance();
        self.diagnostics.insert(message.lexeme);
    }

    fn handle_logging(&mut self, is_log: bool) {
        let end = if is_log {
            TokenKind::Semicolon
        } else {
            TokenKind::Newline
        };
        self.mark_skip_and_advance(); // consume log/logl
        let mut log = String::new();

        loop {
            if self.current().kind == end || self.current().kind == TokenKind::Eof {
                break;
            }
            self.evaluate_token();
            if !self.diagnostics.empty() {
                return;
            }
            let tok = self.current().clone();
            if tok.kind == end || tok.kind == TokenKind::Eof {
                break;
            }
            if tok.kind != TokenKind::Skip && tok.kind != TokenKind::Newline {
                log.push_str(&tok.lexeme);
            }
            self.mark_skip_and_advance();
        }

        if is_log && self.current().kind != TokenKind::Semicolon {
            self.error(PreprocessorError::StatementSemicolon);
            return;
        }
        self.mark_skip_and_advance();
        tracing::info!("{}", log);
    }

    // ---- §4.3.6 Conditional compilation ---------------------------------------

    fn handle_conditional(&mut self) {
        self.mark_skip_and_advance(); // consume `if`
        let condition = self.parse_and_evaluate_condition();
        if !self.diagnostics.empty() {
            return;
        }

        let mut active = condition;
        let mut settled = false;

        loop {
            if active && !settled {
                self.run_active_branch();
                settled = true;
            } else {
                self.skip_dead_branch();
            }
            if !self.diagnostics.empty() {
                return;
            }

            let directive = match self.current().kind {
                TokenKind::Macro => Some(self.current().lexeme.clone()),
                _ => None,
            };

            match directive.as_deref() {
                Some("endif") => {
                    self.mark_skip_and_advance();
                    return;
                }
                Some("elif") => {
                    self.mark_skip_and_advance();
                    if settled {
                        self.skip_condition_expr();
                        active = false;
                    } else {
                        active = self.parse_and_evaluate_condition();
                        if !self.diagnostics.empty() {
                            return;
                        }
                    }
                }
                Some("else") => {
                    self.mark_skip_and_advance();
                    active = !settled;
                }
                _ => {
                    self.error(PreprocessorError::McondEndif);
                    return;
                }
            }
        }
    }

    fn run_active_branch(&mut self) {
        loop {
            if !self.diagnostics.empty() {
                return;
            }
            match self.current().kind {
                TokenKind::Eof => {
                    self.error(PreprocessorError::McondEndif);
                    return;
                }
                TokenKind::Macro => {
                    let lexeme = self.current().lexeme.clone();
                    if lexeme == "if" {
                        self.handle_conditional();
                        continue;
                    }
                    if matches!(lexeme.as_str(), "elif" | "else" | "endif") {
                        return;
                    }
                    self.evaluate_token();
                }
                _ => self.evaluate_token(),
            }
        }
    }

    /// Skips a branch that can never be selected, without evaluating any
    /// nested `#if` expressions (they are dead code).
    fn skip_dead_branch(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.current().kind {
                TokenKind::Eof => {
                    self.error(PreprocessorError::McondEndif);
                    return;
                }
                TokenKind::Macro => {
                    let lexeme = self.current().lexeme.clone();
                    if lexeme == "if" {
                        depth += 1;
                        self.mark_skip_and_advance();
                        continue;
                    }
                    if lexeme == "endif" {
                        if depth == 0 {
                            return;
                        }
                        depth -= 1;
                        self.mark_skip_and_advance();
                        continue;
                    }
                    if depth == 0 && (lexeme == "elif" || lexeme == "else") {
                        return;
                    }
                    self.mark_skip_and_advance();
                }
                _ => self.mark_skip_and_advance(),
            };
        }
    }

    fn parse_and_evaluate_condition(&mut self) -> bool {
        let tokens = self.collect_condition_expr_tokens();
        if !self.diagnostics.empty() {
            return false;
        }
        conditional::evaluate(&tokens, &self.macros, self.diagnostics)
    }

    fn skip_condition_expr(&mut self) {
        self.collect_condition_expr_tokens();
    }

    fn collect_condition_expr_tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            match self.current().kind {
                TokenKind::Newline => {
                    self.mark_skip_and_advance();
                    return tokens;
                }
                TokenKind::Eof => {
                    self.error(PreprocessorError::InvalidMcond);
                    return tokens;
                }
                _ => {
                    tokens.push(self.current().clone());
                    self.mark_skip_and_advance();
                }
            }
        }
    }

    // ---- §4.3.5 File inclusion --------------------------------------------------

    fn handle_importing(&mut self, guarded: bool) {
        self.mark_skip_and_advance(); // consume import/include

        let mut paths = Vec::new();
        loop {
            if self.current().kind == TokenKind::Identifier
                && self.macros.contains_key(&self.current().lexeme)
            {
                self.evaluate_token();
                if !self.diagnostics.empty() {
                    return;
                }
                continue;
            }
            if self.current().kind != TokenKind::String {
                self.error(PreprocessorError::ExpectedFile);
                return;
            }
            paths.push(self.current().lexeme.clone());
            self.mark_skip_and_advance();

            match self.current().kind {
                TokenKind::Comma => {
                    self.mark_skip_and_advance();
                    continue;
                }
                TokenKind::Semicolon => {
                    self.mark_skip_and_advance();
                    break;
                }
                _ => {
                    self.error(PreprocessorError::StatementSemicolon);
                    return;
                }
            }
        }

        self.splice_include(paths, guarded);
    }

    /// Splices the first path's tokens at the cursor; any remaining paths
    /// are re-injected as a synthetic trailing directive so that each file's
    /// `eoi` restores `__FILE__` before the next one is even read (matching
    /// §4.3.5's per-inclusion restore contract for a comma-separated list).
    fn splice_include(&mut self, mut paths: Vec<String>, guarded: bool) {
        if paths.is_empty() {
            return;
        }
        let path = paths.remove(0);

        if guarded && self.included_files.contains(&path) {
            if paths.is_empty() {
                return;
            }
            self.splice_include(paths, guarded);
            return;
        }

        if !self.file_provider.is_file(&path) {
            self.error(PreprocessorError::ImportInvalidFile);
            return;
        }
        let Some(contents) = self.file_provider.read_file(&path, self.diagnostics) else {
            return;
        };
        self.included_files.insert(path.clone());

        let prior_file = self.current_file_lexeme();
        let mut included_tokens = wisp_lexer::lex(&contents, self.diagnostics);
        if !self.diagnostics.empty() {
            return;
        }
        if let Some(last) = included_tokens.last_mut() {
            *last = Token::new(TokenKind::Eoi, prior_file);
        }
        self.macros
            .insert("__FILE__".to_string(), vec![Token::new(TokenKind::String, path)]);

        let mut to_insert = included_tokens;
        if !paths.is_empty() {
            to_insert.extend(Self::synthetic_include_directive(guarded, &paths));
        }

        let splice_at = self.pos;
        self.tokens.splice(splice_at..splice_at, to_insert);
        self.total_size = self.tokens.len();
        self.pos = splice_at;
    }

    fn synthetic_include_directive(guarded: bool, paths: &[String]) -> Vec<Token> {
        let mut tokens = vec![Token::new(
            TokenKind::Macro,
            if guarded { "import" } else { "include" },
        )];
        for (i, path) in paths.iter().enumerate() {
            if i > 0 {
                tokens.push(Token::new(TokenKind::Comma, ","));
            }
            tokens.push(Token::new(TokenKind::String, path.clone()));
        }
        tokens.push(Token::new(TokenKind::Semicolon, ";"));
        tokens
    }

    fn current_file_lexeme(&self) -> String {
        self.macros
            .get("__FILE__")
            .and_then(|body| body.first())
            .map(|t| t.lexeme.clone())
            .unwrap_or_default()
    }

    fn handle_eoi(&mut self, token: &Token) {
        self.macros.insert(
            "__FILE__".to_string(),
            vec![Token::new(TokenKind::String, token.lexeme.clone())],
        );
        self.mark_skip_and_advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_provider::InMemoryFileProvider;

    fn run(source: &str) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = wisp_lexer::lex(source, &mut diagnostics);
        let provider = InMemoryFileProvider::new();
        let tokens = Preprocessor::new(tokens, &mut diagnostics, "", &provider, true).process();
        (tokens, diagnostics)
    }

    fn run_with_provider(source: &str, provider: &dyn FileProvider) -> (Vec<Token>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = wisp_lexer::lex(source, &mut diagnostics);
        let tokens = Preprocessor::new(tokens, &mut diagnostics, "", provider, true).process();
        (tokens, diagnostics)
    }

    fn lexemes(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.lexeme.as_str()).collect()
    }

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn no_control_tokens_survive_cleanup() {
        let (tokens, diagnostics) = run("1\n2;; 3");
        assert!(diagnostics.empty());
        assert!(!tokens.iter().any(|t| t.kind.is_control()));
    }

    #[test]
    fn scenario_simple_substitution() {
        // §8 scenario 1.
        let (tokens, diagnostics) = run("#def N = 42; let x = N;");
        assert!(diagnostics.empty());
        assert_eq!(
            kinds(&tokens),
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::Integer,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
        assert_eq!(lexemes(&tokens), vec!["let", "x", "=", "42", ";", "EOF"]);
    }

    #[test]
    fn scenario_parameterised_macro() {
        // §8 scenario 2.
        let (tokens, diagnostics) = run("#def add(a, b) = a + b; add(1, 2);");
        assert!(diagnostics.empty());
        assert_eq!(lexemes(&tokens), vec!["1", "+", "2", ";", "EOF"]);
    }

    #[test]
    fn scenario_variadic_stringize() {
        // §8 scenario 3.
        let (tokens, diagnostics) =
            run(r#"#def log2(x, ...) = "..."; log2(a, b, c);"#);
        assert!(diagnostics.empty());
        let strings: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::String)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(strings, vec!["b c"]);
    }

    #[test]
    fn scenario_conditional_true_branch() {
        // §8 scenario 4.
        let (tokens, diagnostics) =
            run("#if 1 < 2\n  #def Y = 1;\n#endif\n Y");
        assert!(diagnostics.empty());
        let ints: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Integer)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(ints, vec!["1"]);
    }

    #[test]
    fn scenario_conditional_false_branch_is_skipped() {
        let (tokens, diagnostics) = run("#if 0\n  #def Y = 1;\n#else\n  #def Y = 2;\n#endif\n Y");
        assert!(diagnostics.empty());
        let ints: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Integer)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(ints, vec!["2"]);
    }

    #[test]
    fn scenario_concatenation() {
        // §8 scenario 5.
        let (tokens, diagnostics) = run("foo ## bar;");
        assert!(diagnostics.empty());
        let strings: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::String)
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(strings, vec!["foobar"]);
    }

    #[test]
    fn scenario_equality_operators() {
        // §8 scenario 6.
        let (tokens, diagnostics) = run(r#""a" #== "a";"#);
        assert!(diagnostics.empty());
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[0].lexeme, "1");

        let (tokens, diagnostics) = run(r#""a" #!= "a";"#);
        assert!(diagnostics.empty());
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[0].lexeme, "0");
    }

    #[test]
    fn undef_removes_macro_from_table() {
        let (_, diagnostics) = run("#def N = 1; #undef N; N;");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn calling_a_pure_declaration_macro_is_an_error() {
        let (_, diagnostics) = run("#def FLAG; FLAG;");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn pure_declaration_is_truthy_in_conditional() {
        let (tokens, diagnostics) = run("#def FLAG;\n#if FLAG\n  1;\n#endif");
        assert!(diagnostics.empty());
        assert_eq!(lexemes(&tokens), vec!["1", ";", "EOF"]);
    }

    #[test]
    fn missing_endif_is_an_error() {
        let (_, diagnostics) = run("#if 1\n 1;");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn bare_elif_outside_conditional_is_an_error() {
        let (_, diagnostics) = run("#elif 1\n");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn self_recursive_macro_hits_depth_limit() {
        let (_, diagnostics) = run("#def LOOP = LOOP; LOOP;");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn wrong_arg_count_is_an_error() {
        let (_, diagnostics) = run("#def add(a, b) = a + b; add(1);");
        assert!(!diagnostics.empty());
    }

    #[test]
    fn import_guard_skips_second_inclusion() {
        let provider = InMemoryFileProvider::new().with_file("a.wisp", "1;");
        let (tokens, diagnostics) =
            run_with_provider(r#"#import "a.wisp"; #import "a.wisp";"#, &provider);
        assert!(diagnostics.empty());
        let ints: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Integer)
            .count();
        assert_eq!(ints, 1);
    }

    #[test]
    fn include_bypasses_the_guard() {
        let provider = InMemoryFileProvider::new().with_file("a.wisp", "1;");
        let (tokens, diagnostics) =
            run_with_provider(r#"#include "a.wisp"; #include "a.wisp";"#, &provider);
        assert!(diagnostics.empty());
        let ints: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Integer)
            .count();
        assert_eq!(ints, 2);
    }

    #[test]
    fn importing_a_missing_file_is_an_error() {
        let provider = InMemoryFileProvider::new();
        let (_, diagnostics) = run_with_provider(r#"#import "missing.wisp";"#, &provider);
        assert!(!diagnostics.empty());
    }

    #[test]
    fn error_directive_records_a_diagnostic() {
        let (_, diagnostics) = run(r#"#error "boom";"#);
        assert!(!diagnostics.empty());
    }

    #[test]
    fn builtins_are_installed_unless_skipped() {
        let mut diagnostics = Diagnostics::new();
        let tokens = wisp_lexer::lex("#if __LINUX__ || __MACOS__ || __WIN__\n1;\n#endif", &mut diagnostics);
        let provider = InMemoryFileProvider::new();
        let tokens = Preprocessor::new(tokens, &mut diagnostics, "main.wisp", &provider, false).process();
        assert!(diagnostics.empty());
        assert_eq!(lexemes(&tokens), vec!["1", ";", "EOF"]);
    }
}
