// Tool link and URL tests: titles, site URL shapes and the linker.

use rcfeed::feed::settings::{default_page_tools, default_user_tools, ToolTarget};
use rcfeed::feed::tools::{escape_url, make_link};
use rcfeed::feed::{Linker, RenderContext, ToolDescriptor};
use rcfeed::wiki::{Catalog, NoRevisions, Revision, RevisionLookup, Site, Title};

fn site() -> Site {
    Site::new("https://foo.bar")
}

struct Latest(Revision);

impl RevisionLookup for Latest {
    fn latest_revision(&self, _title: &Title) -> Option<Revision> {
        Some(self.0)
    }
}

// ============================================================
// Titles and URLs
// ============================================================

#[test]
fn parse_splits_known_prefix_case_insensitively() {
    let site = site();
    let title = Title::parse(&site, "user talk:Alice_Smith#Top section").unwrap();
    assert_eq!(title.namespace(), 3);
    assert_eq!(title.text(), "Alice Smith");
    assert_eq!(title.fragment(), Some("Top section"));
    assert_eq!(title.full_text(&site), "User talk:Alice Smith");
}

#[test]
fn unknown_prefix_stays_in_main_namespace() {
    let site = site();
    let title = Title::parse(&site, "Foo:Bar").unwrap();
    assert_eq!(title.namespace(), 0);
    assert_eq!(title.full_text(&site), "Foo:Bar");
}

#[test]
fn full_url_encodes_key_and_fragment() {
    let site = site();
    let title = Title::new(0, "Main Page").with_fragment("Sub section");
    assert_eq!(
        title.full_url(&site, ""),
        "https://foo.bar/index.php/Main_Page#Sub_section"
    );
}

#[test]
fn configured_namespace_names_win() {
    let mut site = site();
    site.namespaces.insert(4, "FemiWiki".to_string());
    let title = Title::parse(&site, "femiwiki:About").unwrap();
    assert_eq!(title.namespace(), 4);
    assert_eq!(title.full_url(&site, ""), "https://foo.bar/index.php/FemiWiki:About");
}

#[test]
fn talk_page_rules() {
    let subject = Title::new(0, "Foo");
    assert_eq!(subject.talk_page(), Some(Title::new(1, "Foo")));
    let talk = Title::new(1, "Foo");
    assert_eq!(talk.talk_page(), Some(talk.clone()));
    assert_eq!(Title::special("Log", None).talk_page(), None);
}

#[test]
fn local_url_detection() {
    let site = site();
    assert!(site.is_local_url("/index.php/Foo"));
    assert!(site.is_local_url("https://foo.bar/w/Foo"));
    assert!(!site.is_local_url("https://foo.bar:8443/w/Foo"));
    assert!(!site.is_local_url("https://example.com/w/Foo"));
}

// ============================================================
// Chat links
// ============================================================

#[test]
fn escape_and_link() {
    assert_eq!(escape_url("a b(c)"), "a%20b%28c%29");
    assert_eq!(escape_url(&escape_url("a b(c)")), "a%20b%28c%29");
    assert_eq!(make_link("", "plain"), "plain");
}

// ============================================================
// Linker
// ============================================================

#[test]
fn user_text_with_default_tools() {
    let site = site();
    let catalog = Catalog::english();
    let users = default_user_tools();
    let linker = Linker::with_tools(RenderContext::new(&site, &catalog, &NoRevisions), &users, &[]);
    assert_eq!(
        linker.user_text_with_tools("Admin"),
        "[Admin](https://foo.bar/index.php/User:Admin) \
         ([talk](https://foo.bar/index.php/User_talk:Admin) | \
         [block](https://foo.bar/index.php/Special:Block/Admin) | \
         [contribs](https://foo.bar/index.php/Special:Contributions/Admin))"
    );
}

#[test]
fn page_tools_with_newline_separator_and_self_link() {
    let site = site();
    let catalog = Catalog::english();
    let revisions = Latest(Revision {
        id: 7,
        parent_id: Some(6),
    });
    let pages = default_page_tools();
    let linker = Linker::with_tools(RenderContext::new(&site, &catalog, &revisions), &[], &pages);
    assert_eq!(
        linker.page_tools(&Title::new(0, "Foo"), Some("\n"), true),
        "[view](https://foo.bar/index.php/Foo)\n\
         [edit](https://foo.bar/index.php?title=Foo&action=edit)\n\
         [diff](https://foo.bar/index.php?title=Foo&oldid=7&diff=prev)\n\
         [hist](https://foo.bar/index.php?title=Foo&action=history)"
    );
}

#[test]
fn text_labels_and_user_page_tool() {
    let site = site();
    let catalog = Catalog::english();
    let users = vec![
        ToolDescriptor::new(ToolTarget::UserPage, "view"),
        ToolDescriptor::new(ToolTarget::Special("Contributions".to_string()), "contribslink"),
    ];
    let linker = Linker::with_tools(RenderContext::new(&site, &catalog, &NoRevisions), &users, &[]);
    // UserPage is the mention itself, so it only shows with include_self
    assert_eq!(
        linker.user_tools("Bob", None, false),
        "[contribs](https://foo.bar/index.php/Special:Contributions/Bob)"
    );
    assert_eq!(
        linker.user_tools("Bob", Some(", "), true),
        "[view](https://foo.bar/index.php/User:Bob), \
         [contribs](https://foo.bar/index.php/Special:Contributions/Bob)"
    );
}

#[test]
fn missing_label_message_is_visible() {
    let site = site();
    let catalog = Catalog::empty();
    let users = vec![ToolDescriptor::new(ToolTarget::Talk, "no-such-message")];
    let linker = Linker::with_tools(RenderContext::new(&site, &catalog, &NoRevisions), &users, &[]);
    assert_eq!(
        linker.user_tools("Bob", Some(" "), false),
        "[⧼no-such-message⧽](https://foo.bar/index.php/User_talk:Bob)"
    );
}
