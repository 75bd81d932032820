use super::*;

fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint =
            if let Some(hex) = value.strip_prefix("x").or_else(|| value.strip_prefix("X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                value.parse::<u32>().ok()?
            };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "copy" => Some('©'),
            "hellip" => Some('…'),
            "times" => Some('×'),
            _ => None,
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let decoded = tail.find(';').and_then(|semicolon| {
            let raw = &tail[..semicolon];
            let ch = if let Some(numeric) = raw.strip_prefix('#') {
                decode_numeric(numeric)
            } else {
                decode_named(raw)
            }?;
            Some((ch, semicolon + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
    Text(&'a str),
    StartTag {
        name: String,
        attrs: HashMap<String, String>,
        self_closing: bool,
    },
    EndTag(String),
}

/// Byte cursor over fixture markup. Slices of `src` are only taken between
/// positions that sit on ASCII bytes, which keeps them valid UTF-8.
#[derive(Debug)]
struct MarkupCursor<'a> {
    src: &'a str,
    i: usize,
}

impl<'a> MarkupCursor<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, i: 0 }
    }

    fn eof(&self) -> bool {
        self.i >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.i).copied()
    }

    fn rest(&self) -> &'a [u8] {
        self.src.as_bytes().get(self.i..).unwrap_or_default()
    }

    fn at(&self, token: &str) -> bool {
        self.rest().starts_with(token.as_bytes())
    }

    fn consume_ascii(&mut self, token: &str) -> bool {
        if self.at(token) {
            self.i += token.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.i += 1;
        }
    }

    fn take_while(&mut self, accept: impl Fn(u8) -> bool) -> &'a str {
        let start = self.i;
        while self.peek().is_some_and(&accept) {
            self.i += 1;
        }
        &self.src[start..self.i]
    }

    /// Moves past the next `needle`, returning the text before it.
    fn take_until(&mut self, needle: &str) -> Option<&'a str> {
        let offset = self.src.get(self.i..)?.find(needle)?;
        let body = &self.src[self.i..self.i + offset];
        self.i += offset + needle.len();
        Some(body)
    }

    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        loop {
            if self.eof() {
                return Ok(None);
            }
            if self.consume_ascii("<!--") {
                self.take_until("-->")
                    .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
                continue;
            }
            if self.consume_ascii("</") {
                return self.end_tag().map(Some);
            }
            if self.consume_ascii("<!") {
                self.skip_declaration()?;
                continue;
            }
            if self.consume_ascii("<") {
                return self.start_tag().map(Some);
            }
            return Ok(Some(Token::Text(self.take_while(|b| b != b'<'))));
        }
    }

    fn start_tag(&mut self) -> Result<Token<'a>> {
        self.skip_ws();
        let name = self.take_while(is_tag_char).to_ascii_lowercase();
        if name.is_empty() {
            return Err(Error::HtmlParse("empty tag name".into()));
        }

        let mut attrs = HashMap::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(Error::HtmlParse(format!("unclosed start tag <{name}"))),
                Some(b'>') => {
                    self.i += 1;
                    return Ok(Token::StartTag {
                        name,
                        attrs,
                        self_closing: false,
                    });
                }
                Some(_) if self.consume_ascii("/>") => {
                    return Ok(Token::StartTag {
                        name,
                        attrs,
                        self_closing: true,
                    });
                }
                Some(b) if is_attr_name_char(b) => {
                    let (key, value) = self.attribute()?;
                    attrs.entry(key).or_insert(value);
                }
                Some(_) => {
                    // Stray bytes such as a lone `/` or a quote.
                    self.i += 1;
                    while self
                        .peek()
                        .is_some_and(|b| !b.is_ascii_whitespace() && b != b'>' && b != b'/')
                    {
                        self.i += 1;
                    }
                }
            }
        }
    }

    fn attribute(&mut self) -> Result<(String, String)> {
        let key = self.take_while(is_attr_name_char).to_ascii_lowercase();
        self.skip_ws();
        if !self.consume_ascii("=") {
            return Ok((key, String::new()));
        }
        self.skip_ws();

        let raw = match self.peek() {
            None => return Err(Error::HtmlParse(format!("missing value for attribute {key}"))),
            Some(quote @ (b'"' | b'\'')) => {
                self.i += 1;
                let closing = if quote == b'"' { "\"" } else { "'" };
                self.take_until(closing).ok_or_else(|| {
                    Error::HtmlParse(format!("unclosed quoted value for attribute {key}"))
                })?
            }
            Some(_) => {
                let start = self.i;
                while let Some(b) = self.peek() {
                    if b.is_ascii_whitespace() || b == b'>' || self.at("/>") {
                        break;
                    }
                    self.i += 1;
                }
                &self.src[start..self.i]
            }
        };
        Ok((key, decode_html_character_references(raw)))
    }

    fn end_tag(&mut self) -> Result<Token<'a>> {
        self.skip_ws();
        let name = self.take_while(is_tag_char).to_ascii_lowercase();
        self.take_until(">")
            .ok_or_else(|| Error::HtmlParse(format!("unclosed end tag </{name}")))?;
        Ok(Token::EndTag(name))
    }

    // `<!DOCTYPE ...>` and friends; `>` inside quotes does not end them.
    fn skip_declaration(&mut self) -> Result<()> {
        let mut quote = None;
        while let Some(b) = self.peek() {
            self.i += 1;
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'>') => return Ok(()),
                (None, _) => {}
            }
        }
        Err(Error::HtmlParse("unclosed declaration tag".into()))
    }

    /// Body of a raw-text element up to its end tag, which is consumed.
    fn raw_text(&mut self, tag: &str) -> Result<&'a str> {
        let start = self.i;
        while !self.eof() {
            if self.at("</") {
                let body_end = self.i;
                self.i += 2;
                self.skip_ws();
                let name = self.take_while(|b| b.is_ascii_alphanumeric());
                if name.eq_ignore_ascii_case(tag) {
                    self.take_until(">")
                        .ok_or_else(|| Error::HtmlParse(format!("unclosed end tag </{tag}")))?;
                    return Ok(&self.src[start..body_end]);
                }
                continue;
            }
            self.i += 1;
        }
        Err(Error::HtmlParse(format!("unclosed <{tag}>")))
    }
}

/// Parses an HTML fixture into a fresh [`Dom`].
///
/// This is a forgiving tree builder for test pages: end tags with no open
/// match are dropped, `<li>` implicitly closes an open sibling `<li>`, and
/// `<script>`, `<style>`, `<textarea>` and `<title>` bodies are kept as raw
/// text.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut open = vec![dom.root];
    let mut cursor = MarkupCursor::new(html);

    while let Some(token) = cursor.next_token()? {
        let parent = open.last().copied().unwrap_or(dom.root);
        match token {
            Token::Text(text) => {
                let decoded = decode_html_character_references(text);
                if !decoded.is_empty() {
                    dom.create_text(parent, decoded);
                }
            }
            Token::EndTag(name) => {
                if let Some(depth) = open.iter().skip(1).rposition(|node| dom.has_tag(*node, &name)) {
                    open.truncate(depth + 1);
                }
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                if name == "li" {
                    close_open_list_item(&dom, &mut open);
                }
                let parent = open.last().copied().unwrap_or(dom.root);
                let node = dom.create_element(parent, name.clone(), attrs);
                if self_closing || is_void_tag(&name) {
                    continue;
                }
                if is_raw_text_tag(&name) {
                    let body = cursor.raw_text(&name)?;
                    if !body.is_empty() {
                        dom.create_text(node, body.to_string());
                    }
                    continue;
                }
                open.push(node);
            }
        }
    }

    for node in dom.all_element_nodes() {
        if dom.has_tag(node, "textarea") {
            let text = dom.text_content(node);
            dom.set_value(node, &text)?;
        }
    }

    dom.rebuild_id_index();
    Ok(dom)
}

// Pops back to (and including) the nearest `<li>` that is not shielded by an
// enclosing list.
fn close_open_list_item(dom: &Dom, open: &mut Vec<NodeId>) {
    for depth in (1..open.len()).rev() {
        if dom.has_tag(open[depth], "li") {
            open.truncate(depth);
            return;
        }
        if dom.has_tag(open[depth], "ul") || dom.has_tag(open[depth], "ol") {
            return;
        }
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    is_tag_char(b) || b == b':'
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea" | "title")
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}
