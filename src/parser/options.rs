/// Options for parsing and rendering.
///
/// Every toggle is independent and off by default, so
/// `ParseOptions::default()` gives plain CommonMark behavior.
#[derive(Default, Debug, Clone)]
pub struct ParseOptions {
    /// Enables strikethrough using `~~text~~` (or `~text~`).
    ///
    /// ```
    /// # use inkmark::{markdown_to_html, ParseOptions};
    /// let mut options = ParseOptions::default();
    /// options.strikethrough = true;
    /// assert_eq!(markdown_to_html("Hello ~world~.", &options),
    ///            "<p>Hello <del>world</del>.</p>\n");
    /// ```
    pub strikethrough: bool,

    /// Enables tables.
    ///
    /// ```
    /// # use inkmark::{markdown_to_html, ParseOptions};
    /// let mut options = ParseOptions::default();
    /// options.table = true;
    /// assert_eq!(markdown_to_html("| a | b |\n|---|---|\n| c | d |", &options),
    ///            "<table>\n<thead>\n<tr>\n<th>a</th>\n<th>b</th>\n</tr>\n</thead>\n\
    ///             <tbody>\n<tr>\n<td>c</td>\n<td>d</td>\n</tr>\n</tbody>\n</table>\n");
    /// ```
    pub table: bool,

    /// Enables task list items: `- [x] done`.
    pub tasklist: bool,

    /// Enables footnotes: `[^note]` references with `[^note]: ...`
    /// definitions.
    pub footnotes: bool,

    /// Enables inline `$math$` / `$$display math$$` spans and `$$` fenced
    /// math blocks.
    ///
    /// ```
    /// # use inkmark::{markdown_to_html, ParseOptions};
    /// let mut options = ParseOptions::default();
    /// options.math = true;
    /// assert_eq!(markdown_to_html("$x^2$", &options),
    ///            "<p><span data-math-style=\"inline\">x^2</span></p>\n");
    /// ```
    pub math: bool,

    /// Enables emoji shortcodes like `:fire:`.
    pub emoji: bool,

    /// Enables linking bare URLs, `www.` domains and email addresses
    /// without angle brackets.
    ///
    /// ```
    /// # use inkmark::{markdown_to_html, ParseOptions};
    /// let mut options = ParseOptions::default();
    /// options.autolink = true;
    /// assert_eq!(markdown_to_html("See www.example.com.", &options),
    ///            "<p>See <a href=\"http://www.example.com\">www.example.com</a>.</p>\n");
    /// ```
    pub autolink: bool,

    /// Enables `{#id .class key=value}` attribute blocks on headings, fenced
    /// code blocks, links, images and custom containers.
    pub attributes: bool,

    /// A string prepended to every id emitted from attribute blocks and
    /// auto-identifiers.
    pub attribute_prefix: Option<String>,

    /// Generates an id for every heading, GitHub style.
    ///
    /// ```
    /// # use inkmark::{markdown_to_html, ParseOptions};
    /// let mut options = ParseOptions::default();
    /// options.auto_identifiers = true;
    /// assert_eq!(markdown_to_html("# Some Heading", &options),
    ///            "<h1 id=\"some-heading\">Some Heading</h1>\n");
    /// ```
    pub auto_identifiers: bool,

    /// Makes every heading usable as a link reference:
    /// `[Some Heading]` resolves to `#some-heading` without an explicit
    /// definition. Explicit definitions still win.
    pub heading_references: bool,

    /// Enables `:::`-fenced custom containers:
    ///
    /// ``` md
    /// ::: warning
    /// Mind the gap.
    /// :::
    /// ```
    pub custom_containers: bool,

    /// Enables alphabetic (`a.`), Roman (`iv.`) and Greek (`β.`) ordered
    /// list markers in addition to numeric ones.
    pub extra_list_styles: bool,

    /// Records a line/column locator on the document so byte spans can be
    /// translated with [`Document::locate`](crate::nodes::Document::locate).
    pub locator: bool,

    /// Passes raw HTML through to the output instead of replacing it with a
    /// placeholder comment. Only enable for trusted input.
    pub unsafe_html: bool,
}
