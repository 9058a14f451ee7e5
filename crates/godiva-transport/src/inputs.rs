//! Static engine configuration: `xml/materials.xml` and `xml/settings.xml`.
//!
//! These files are consumed, never produced. Materials are embedded verbatim
//! in every exported model; settings are re-emitted with any
//! `<volume_calc>` removed so each model can add its own.

use std::path::{Path, PathBuf};

use godiva_core::MaterialCatalog;
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use thiserror::Error;

/// Errors from loading the static inputs. All of them are fatal.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML in {path}: {message}")]
    Xml { path: PathBuf, message: String },

    #[error("{path} has no <{element}> element")]
    Missing { path: PathBuf, element: &'static str },

    #[error("materials.xml does not match the material catalog: {0}")]
    Catalog(String),
}

/// A material declared in `materials.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialEntry {
    pub id: u32,
    pub name: String,
}

/// Parsed `materials.xml`.
#[derive(Debug, Clone)]
pub struct MaterialsFile {
    /// Root element text, without the XML declaration.
    pub raw: String,
    pub materials: Vec<MaterialEntry>,
}

/// Parsed `settings.xml`.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    /// `<settings>` and its children minus any `<volume_calc>`, with the
    /// closing tag left off so more children can follow.
    pub open: String,
}

/// Both static inputs, loaded once per sweep.
#[derive(Debug, Clone)]
pub struct StaticInputs {
    pub materials: MaterialsFile,
    pub settings: SettingsFile,
}

impl StaticInputs {
    /// Load `materials.xml` and `settings.xml` from `xml_dir`.
    pub fn load(xml_dir: &Path) -> Result<Self, InputError> {
        let materials_path = xml_dir.join("materials.xml");
        let settings_path = xml_dir.join("settings.xml");
        let materials = MaterialsFile::parse(&read(&materials_path)?, &materials_path)?;
        let settings = SettingsFile::parse(&read(&settings_path)?, &settings_path)?;
        Ok(Self {
            materials,
            settings,
        })
    }

    /// Every catalog material must be declared with the same id and name.
    pub fn check_catalog(&self, catalog: &MaterialCatalog) -> Result<(), InputError> {
        for (id, name) in catalog.iter() {
            match self.material_name(id) {
                Some(found) if found == name => {}
                Some(found) => {
                    return Err(InputError::Catalog(format!(
                        "material {} is named '{}', expected '{}'",
                        id, found, name
                    )))
                }
                None => {
                    return Err(InputError::Catalog(format!(
                        "material {} ('{}') is not declared",
                        id, name
                    )))
                }
            }
        }
        Ok(())
    }

    pub fn material_name(&self, id: u32) -> Option<&str> {
        self.materials
            .materials
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.as_str())
    }

    pub fn material_ids(&self) -> Vec<u32> {
        self.materials.materials.iter().map(|m| m.id).collect()
    }
}

fn read(path: &Path) -> Result<String, InputError> {
    std::fs::read_to_string(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Drop a leading `<?xml ...?>` declaration.
pub(crate) fn strip_declaration(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("<?xml") {
        Some(rest) => rest.split_once("?>").map_or(trimmed, |(_, body)| body.trim()),
        None => trimmed,
    }
}

fn xml_error(path: &Path, message: impl ToString) -> InputError {
    InputError::Xml {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

impl MaterialsFile {
    pub fn parse(content: &str, path: &Path) -> Result<Self, InputError> {
        let mut reader = Reader::from_str(content);
        let mut saw_root = false;
        let mut materials = Vec::new();

        loop {
            match reader.read_event().map_err(|e| xml_error(path, e))? {
                Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                    b"materials" => saw_root = true,
                    b"material" => {
                        let mut id = None;
                        let mut name = None;
                        for attr in e.attributes() {
                            let attr = attr.map_err(|e| xml_error(path, e))?;
                            let value = attr.unescape_value().map_err(|e| xml_error(path, e))?;
                            match attr.key.as_ref() {
                                b"id" => {
                                    id = Some(value.trim().parse::<u32>().map_err(|_| {
                                        xml_error(path, format!("material id '{}' is not an integer", value))
                                    })?)
                                }
                                b"name" => name = Some(value.into_owned()),
                                _ => {}
                            }
                        }
                        let id = id.ok_or_else(|| xml_error(path, "<material> without an id"))?;
                        let name = name.ok_or_else(|| {
                            xml_error(path, format!("material {} has no name", id))
                        })?;
                        materials.push(MaterialEntry { id, name });
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_root {
            return Err(InputError::Missing {
                path: path.to_path_buf(),
                element: "materials",
            });
        }
        Ok(Self {
            raw: strip_declaration(content).to_string(),
            materials,
        })
    }
}

impl SettingsFile {
    /// Closing tag for [`SettingsFile::open`].
    pub const CLOSE: &'static str = "</settings>";

    pub fn parse(content: &str, path: &Path) -> Result<Self, InputError> {
        let mut reader = Reader::from_str(content);
        let mut writer = Writer::new(Vec::new());
        let mut saw_root = false;
        // Depth inside a <volume_calc> being dropped.
        let mut skip = 0usize;

        loop {
            let event = reader.read_event().map_err(|e| xml_error(path, e))?;
            let keep = match event {
                Event::Eof => break,
                Event::Start(_) if skip > 0 => {
                    skip += 1;
                    None
                }
                Event::End(_) if skip > 0 => {
                    skip -= 1;
                    None
                }
                _ if skip > 0 => None,
                Event::Start(e) if e.name().as_ref() == b"volume_calc" => {
                    skip = 1;
                    None
                }
                Event::Empty(e) if e.name().as_ref() == b"volume_calc" => None,
                Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"settings" => {
                    saw_root = true;
                    Some(Event::Start(e))
                }
                Event::End(e) if e.name().as_ref() == b"settings" => break,
                _ if !saw_root => None,
                other => Some(other),
            };
            if let Some(event) = keep {
                writer.write_event(event).map_err(|e| xml_error(path, e))?;
            }
        }

        if !saw_root {
            return Err(InputError::Missing {
                path: path.to_path_buf(),
                element: "settings",
            });
        }
        let mut open = String::from_utf8(writer.into_inner()).map_err(|e| xml_error(path, e))?;
        if !open.ends_with('\n') {
            open.push('\n');
        }
        Ok(Self { open })
    }
}
