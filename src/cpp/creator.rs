//! Rendering of the aggregate and static generated files.
//!
//! A [`Creator`] renders one input-dependent file from the finished
//! resource list; the list must already be in canonical order, and every
//! creator walks it in that same order so the generated enum, mapping
//! table, and declarations always line up. The input-independent files
//! (decompressor sources, repo dotfiles) are written verbatim from
//! [`templates`].

use crate::vfs::{join, Fs};

use super::resource::{var_name, ResourceMeta};
use super::templates;
use super::CppError;

use std::io::Write;

/// One input-dependent aggregate file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Creator {
    /// `id.hpp`: the `res::ID` enum, one constant per resource.
    Id,
    /// `mappings.cxx`: the ID-to-definition table.
    Mappings,
    /// `mapper.hpp`: the accessor class with per-resource declarations.
    MapperHdr,
    /// `CMakeLists.txt`: the build description listing every decl unit.
    CMakeLists,
}

/// Every aggregate file, in the order they are reported on failure.
pub const ALL_CREATORS: [Creator; 4] = [
    Creator::Id,
    Creator::Mappings,
    Creator::MapperHdr,
    Creator::CMakeLists,
];

impl Creator {
    /// The file this creator writes, relative to the output root.
    pub fn file_name(self) -> &'static str {
        match self {
            Creator::Id => "id.hpp",
            Creator::Mappings => "mappings.cxx",
            Creator::MapperHdr => "mapper.hpp",
            Creator::CMakeLists => "CMakeLists.txt",
        }
    }

    /// Render the file's full text from the sorted resource list.
    pub fn render(self, metas: &[ResourceMeta]) -> String {
        match self {
            Creator::Id => render_sections(templates::ID_HEAD, templates::ID_TAIL, metas, |m| {
                format!("\t{}, // {}\n", m.var_name(), m.name)
            }),
            Creator::Mappings => render_sections(
                templates::MAPPINGS_HEAD,
                templates::MAPPINGS_TAIL,
                metas,
                |m| {
                    let v = m.var_name();
                    format!(
                        "\t// res/{name}\n\
                         \t{{ ID::{v},\n\
                         \t  {{\n\
                         \t    .compressed_length   = std::extent<decltype({v})>::value,\n\
                         \t    .decompressed_length = {v}_len,\n\
                         \t    .content             = {v},\n\
                         \t  }} }},\n",
                        name = m.name,
                        v = v,
                    )
                },
            ),
            Creator::MapperHdr => render_sections(
                templates::MAPPER_HDR_HEAD,
                templates::MAPPER_HDR_TAIL,
                metas,
                |m| {
                    let v = m.var_name();
                    format!(
                        "\t// {}\n\
                         \tstatic const size_t        {}_len;\n\
                         \tstatic const unsigned char {}[];\n",
                        m.name, v, v,
                    )
                },
            ),
            Creator::CMakeLists => render_sections(
                templates::CMAKE_HEAD,
                templates::CMAKE_TAIL,
                metas,
                |m| format!("  res/{}_decl.cxx\n", m.var_name()),
            ),
        }
    }

    /// Render and write this creator's file at the root of `fs`.
    pub fn create(self, fs: &Fs, metas: &[ResourceMeta]) -> Result<(), CppError> {
        write_file(fs, self.file_name(), &self.render(metas))
    }
}

fn render_sections(
    head: &str,
    tail: &str,
    metas: &[ResourceMeta],
    section: impl Fn(&ResourceMeta) -> String,
) -> String {
    let mut out = String::from(head);
    for m in metas {
        out.push_str(&section(m));
    }
    out.push_str(tail);
    out
}

/// The text of `res/<ident>_decl.cxx`: the definition unit that pulls the
/// encoded payload in through an `#include`.
pub fn render_decl(meta: &ResourceMeta) -> String {
    let v = meta.var_name();
    format!(
        "#include \"mapper.hpp\"\n\
         \n\
         namespace res {{\n\
         \x20   const size_t        Mapper::{v}_len = {size};\n\
         \x20   const unsigned char Mapper::{v}[]   = {{\n\
         #include \"{v}_real.cxx\"\n\
         \x20   }};\n\
         }}; // namespace res\n",
        v = v,
        size = meta.size,
    )
}

/// The staged path of a resource's encoded-payload file.
pub fn asset_path(name: &str) -> String {
    join("res", &format!("{}_real.cxx", var_name(name)))
}

/// The staged path of a resource's declaration unit.
pub fn decl_path(name: &str) -> String {
    join("res", &format!("{}_decl.cxx", var_name(name)))
}

/// The input-independent files and their verbatim contents.
pub const STATIC_FILES: [(&str, &str); 6] = [
    ("mapper.cxx", templates::MAPPER_IMPL),
    ("resource.hpp", templates::RESOURCE_HDR),
    ("resource.cxx", templates::RESOURCE_IMPL),
    (".gitmodules", templates::GIT_MODULES),
    (".gitignore", templates::GIT_IGNORE),
    (".clang-format", templates::CLANG_FORMAT),
];

/// Write every input-independent file at the root of `fs`.
pub fn create_static_files(fs: &Fs) -> Result<(), CppError> {
    for (name, text) in STATIC_FILES {
        write_file(fs, name, text)?;
    }
    Ok(())
}

fn write_file(fs: &Fs, name: &str, text: &str) -> Result<(), CppError> {
    let mut w = fs.create(name).map_err(|e| CppError::Create {
        file: name.to_string(),
        source: e,
    })?;

    w.write_all(text.as_bytes())
        .and_then(|()| w.close())
        .map_err(|e| CppError::Write {
            file: name.to_string(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::MemFs;
    use std::io::Read;

    fn metas() -> Vec<ResourceMeta> {
        ["al.gif", "al.jpg", "bob.gif", "bob.jpg"]
            .iter()
            .enumerate()
            .map(|(i, name)| ResourceMeta {
                name: name.to_string(),
                size: 100 + i as u64,
                compressed_size: 50 + i as u64,
            })
            .collect()
    }

    #[test]
    fn test_id_enum_lists_all_in_order() {
        let text = Creator::Id.render(&metas());

        let a = text.find("\tal_gif, // al.gif\n").unwrap();
        let b = text.find("\tal_jpg, // al.jpg\n").unwrap();
        let c = text.find("\tbob_gif, // bob.gif\n").unwrap();
        let d = text.find("\tbob_jpg, // bob.jpg\n").unwrap();
        assert!(a < b && b < c && c < d);

        assert!(text.starts_with("#ifndef RES_ID\n"));
        assert!(text.ends_with("#endif\n"));
    }

    #[test]
    fn test_mappings_entries_reference_identifiers() {
        let text = Creator::Mappings.render(&metas());

        assert!(text.contains("\t// res/al.gif\n"));
        assert!(text.contains("\t{ ID::al_gif,\n"));
        assert!(text.contains(".compressed_length   = std::extent<decltype(al_gif)>::value,"));
        assert!(text.contains(".decompressed_length = al_gif_len,"));
        assert!(text.contains(".content             = al_gif,"));
    }

    #[test]
    fn test_mapper_header_declares_each_resource() {
        let text = Creator::MapperHdr.render(&metas());

        assert!(text.contains("\t// bob.jpg\n"));
        assert!(text.contains("\tstatic const size_t        bob_jpg_len;\n"));
        assert!(text.contains("\tstatic const unsigned char bob_jpg[];\n"));
        assert!(text.contains("static std::map<ID, const resDefn> mappings;"));
    }

    #[test]
    fn test_cmake_lists_every_decl_unit() {
        let text = Creator::CMakeLists.render(&metas());

        assert!(text.contains("add_library(Resource STATIC\n"));
        assert!(text.contains("  res/al_gif_decl.cxx\n"));
        assert!(text.contains("  res/bob_jpg_decl.cxx\n"));
        assert!(text.contains("target_link_libraries(Resource libzstd_static)"));
    }

    #[test]
    fn test_decl_exact_text() {
        let meta = ResourceMeta {
            name: "dat.txt".to_string(),
            size: 1234,
            compressed_size: 99,
        };

        assert_eq!(
            render_decl(&meta),
            "#include \"mapper.hpp\"\n\
             \n\
             namespace res {\n\
             \x20   const size_t        Mapper::dat_txt_len = 1234;\n\
             \x20   const unsigned char Mapper::dat_txt[]   = {\n\
             #include \"dat_txt_real.cxx\"\n\
             \x20   };\n\
             }; // namespace res\n"
        );
    }

    #[test]
    fn test_paths_use_derived_identifier() {
        assert_eq!(asset_path("dat.txt"), "res/dat_txt_real.cxx");
        assert_eq!(decl_path("dat.txt"), "res/dat_txt_decl.cxx");
    }

    #[test]
    fn test_create_writes_to_backend() {
        let fs = Fs::Mem(MemFs::new());
        Creator::Id.create(&fs, &metas()).unwrap();

        let mut text = String::new();
        fs.open("id.hpp").unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, Creator::Id.render(&metas()));
    }

    #[test]
    fn test_static_files_all_written() {
        let fs = Fs::Mem(MemFs::new());
        create_static_files(&fs).unwrap();

        for (name, text) in STATIC_FILES {
            let mut got = String::new();
            fs.open(name).unwrap().read_to_string(&mut got).unwrap();
            assert_eq!(got, text, "{}", name);
        }
    }

    #[test]
    fn test_static_files_reference_decompressor() {
        let by_name = |n: &str| {
            STATIC_FILES
                .iter()
                .find(|(name, _)| *name == n)
                .map(|(_, text)| *text)
                .unwrap()
        };

        assert!(by_name("mapper.cxx").contains("ZSTD_createDCtx"));
        assert!(by_name("resource.cxx").contains("ZSTD_decompressStream"));
        assert!(by_name(".gitmodules").contains("facebook/zstd"));
    }
}
