// 站点模型的持久化与重命名

use std::fs;

use gridpress::models::{Content, ContentType, GeneratorConfig, Item, Menu, MenuItem, Row, Section, SiteModel};
use gridpress::plugins::PluginRegistry;
use pretty_assertions::assert_eq;

fn content(content_type: ContentType, title: &str) -> Content {
    let mut row = Row::new();
    row.insert_columns("1/2-1/2".parse().unwrap());
    row.columns[0].append_item(Item::text("<p>left</p>"));
    row.columns[1].append_item(Item::new("Markdown").with_attribute("text", "right"));
    let mut section = Section::new(false);
    section.append_row(row);

    let mut content = Content::new(content_type);
    content.title = title.to_string();
    content.source = Content::source_from_title(title);
    content.append_section(section);
    content
}

#[test]
fn site_and_contents_survive_a_save_and_load() {
    let root = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::new(root.path().join("install"));
    let registry = PluginRegistry::with_builtin();

    let mut site = SiteModel::new("Demo Site", root.path().join("source"));
    site.author = "Ada".to_string();
    site.attributes.insert("github".to_string(), "ada".to_string());
    site.menus.push(Menu {
        name: "main".to_string(),
        items: vec![MenuItem::new("Home", "index.html")],
    });
    site.save().unwrap();

    let about = content(ContentType::Page, "About Us");
    let hello = content(ContentType::Post, "Hello World");
    assert_eq!(about.source, "about-us.xml");
    site.save_content(&about, &registry, &config).unwrap();
    site.save_content(&hello, &registry, &config).unwrap();
    // 非内容文件会被忽略
    fs::write(site.source_path.join("pages/notes.txt"), "ignore").unwrap();

    let loaded = SiteModel::load(&site.source_path).unwrap();
    assert_eq!(loaded.title, "Demo Site");
    assert_eq!(loaded.author, "Ada");
    assert_eq!(loaded.menus, site.menus);
    assert_eq!(loaded.attributes, site.attributes);
    assert_eq!(loaded.pages, vec![about]);
    assert_eq!(loaded.posts, vec![hello.clone()]);
    assert_eq!(loaded.find_content("hello-world.xml"), Some(&hello));
}

#[test]
fn add_replaces_and_remove_drops_by_source() {
    let mut site = SiteModel::new("Demo", "/tmp/unused");
    let first = content(ContentType::Page, "About");
    let mut second = first.clone();
    second.layout = "wide".to_string();

    site.add_content(first);
    site.add_content(second);
    assert_eq!(site.pages.len(), 1);
    assert_eq!(site.pages[0].layout, "wide");

    assert!(site.remove_content("about.xml", ContentType::Post).is_none());
    assert!(site.remove_content("about.xml", ContentType::Page).is_some());
    assert!(site.pages.is_empty());
}

#[test]
fn rename_moves_the_output_directory() {
    let root = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::new(root.path().join("install"));
    let mut site = SiteModel::new("Old", root.path().join("source"));
    site.save().unwrap();

    let old_dir = config.site_output_dir("Old").unwrap();
    fs::create_dir_all(&old_dir).unwrap();
    fs::write(old_dir.join("index.html"), "x").unwrap();

    site.rename("New", &config).unwrap();

    assert!(!old_dir.exists());
    assert!(config.site_output_dir("New").unwrap().join("index.html").exists());
    assert_eq!(SiteModel::load(&site.source_path).unwrap().title, "New");
}

#[test]
fn rename_rejects_titles_that_leave_the_sites_directory() {
    let root = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::new(root.path().join("install"));
    let mut site = SiteModel::new("Old", root.path().join("source"));
    site.save().unwrap();
    let old_dir = config.site_output_dir("Old").unwrap();
    fs::create_dir_all(&old_dir).unwrap();

    for title in ["", "..", "../escaped", "a/b"] {
        assert!(site.rename(title, &config).is_err(), "{:?}", title);
    }

    assert_eq!(site.title, "Old");
    assert_eq!(SiteModel::load(&site.source_path).unwrap().title, "Old");
    assert!(old_dir.exists());
    assert!(!root.path().join("install/escaped").exists());
}

#[test]
fn saving_content_with_unknown_element_fails() {
    let root = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::new(root.path());
    let site = SiteModel::new("Demo", root.path().join("source"));
    let mut page = content(ContentType::Page, "Gallery");
    page.sections[0].rows[0].columns[0].append_item(Item::new("Gallery"));

    assert!(site.save_content(&page, &PluginRegistry::new(), &config).is_err());
    assert!(!site.content_path(ContentType::Page, "gallery.xml").exists());
}

#[test]
fn generator_config_round_trips_through_yaml() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("gridpress.yml");
    let mut config = GeneratorConfig::new(root.path().join("install"));
    config.core_imports.push("GridPress.Extras 1.1".to_string());
    config.save(&path).unwrap();

    assert_eq!(GeneratorConfig::load(&path).unwrap(), config);
    assert_eq!(config.sites_path(), root.path().join("install/sites"));
    assert_eq!(config.themes_path(), root.path().join("install/themes"));
}
