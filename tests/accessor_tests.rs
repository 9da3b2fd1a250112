use loadout::{Database, Decimal, Entry, NodeStore, Vector};
use std::fmt;
use std::str::FromStr;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Renderer {
    Software,
    OpenGl,
    Vulkan,
}

impl fmt::Display for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Renderer::Software => "Software",
            Renderer::OpenGl => "OpenGl",
            Renderer::Vulkan => "Vulkan",
        };
        f.write_str(name)
    }
}

impl FromStr for Renderer {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Software" => Ok(Renderer::Software),
            "OpenGl" => Ok(Renderer::OpenGl),
            "Vulkan" => Ok(Renderer::Vulkan),
            _ => Err(()),
        }
    }
}

fn new_db() -> Database {
    Database::new("launcher", "xml", "bin").unwrap()
}

#[test]
fn test_launch_profile_persists_through_both_formats() {
    let dir = TempDir::new().unwrap();

    let mut db = new_db();
    db.add_content("Executable", "gzdoom.exe").unwrap();
    db.add_content("Iwad", "DOOM2.WAD").unwrap();
    db.add_content("Width", 2560i64).unwrap();
    db.add_content("Height", 1440i64).unwrap();
    db.add_content("Gamma", 1.2f64).unwrap();
    db.add_enum("Renderer", Renderer::Vulkan).unwrap();
    db.set_flag("NoMonsters", true);
    db.set_flag("FastMonsters", false);

    let mut files = Entry::new("ExtraFiles");
    files
        .add_child(Entry::with_content("0", "brutality.pk3"))
        .unwrap();
    files
        .add_child(Entry::with_content("1", "maps.wad"))
        .unwrap();
    db.add_entry(files).unwrap();

    for file in ["profile.bin", "profile.xml"] {
        let path = dir.path().join(file);
        db.save(&path).unwrap();

        let mut reloaded = new_db();
        reloaded.load(&path).unwrap();

        assert_eq!(reloaded.get_text("Executable"), Some("gzdoom.exe"), "{file}");
        assert_eq!(reloaded.get_integer("Width"), Some(2560));
        assert_eq!(reloaded.get_integer("Height"), Some(1440));
        assert_eq!(reloaded.get_double("Gamma"), Some(1.2));
        assert_eq!(reloaded.get_enum::<Renderer>("Renderer"), Some(Renderer::Vulkan));
        assert!(reloaded.flag("NoMonsters"));
        assert!(!reloaded.flag("FastMonsters"));

        let files = reloaded.entry("ExtraFiles").unwrap();
        let names: Vec<_> = files.children().map(|c| c.text().unwrap()).collect();
        assert_eq!(names, ["brutality.pk3", "maps.wad"]);
    }
}

#[test]
fn test_nested_entry_helpers() {
    let mut db = new_db();

    let mut video = Entry::new("Video");
    video.add_content("Width", 1920i64).unwrap();
    video
        .add_content("TintColor", Vector::new(vec![
            Decimal::new(10, 1),
            Decimal::new(5, 1),
            Decimal::new(0, 0),
        ]).unwrap())
        .unwrap();
    db.add_entry(video).unwrap();

    let video = db.entry("Video").unwrap();
    assert_eq!(video.get_integer("Width"), Some(1920));

    let tint = video.get_vector("TintColor").unwrap();
    assert_eq!(tint.r(), Decimal::new(10, 1));
    assert_eq!(tint.g(), Some(Decimal::new(5, 1)));
    assert_eq!(tint.b(), Some(Decimal::ZERO));
    assert_eq!(tint.a(), None);
}

#[test]
fn test_get_enum_is_soft_on_wrong_kind() {
    let mut db = new_db();
    db.add_content("Renderer", 3i64).unwrap();
    assert_eq!(db.get_enum::<Renderer>("Renderer"), None);
}

#[test]
fn test_flag_round_trip_preserves_bareness() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flags.xml");

    let mut db = new_db();
    db.set_flag("Turbo", true);
    db.save(&path).unwrap();

    let mut reloaded = new_db();
    reloaded.load(&path).unwrap();
    assert!(reloaded.flag("Turbo"));
    assert!(reloaded.entry("Turbo").unwrap().content().is_none());
}
