//! Text of the generated files.
//!
//! The static templates are written verbatim at the start of a run; the
//! `*_HEAD`/`*_TAIL` pairs bracket the per-resource sections rendered by
//! the creators. Generated C++ decompresses through the zstd streaming
//! API, so the emitted project carries zstd as a submodule.

/// `mapper.cxx` — accessor implementation (input-independent).
pub const MAPPER_IMPL: &str = r#"#include <map>

#include "zstd.h"

#include "id.hpp"
#include "mapper.hpp"
#include "resource.hpp"

namespace res {
    std::unique_ptr<Resource> Mapper::Fetch(ID id) noexcept(false) {
	// This will never fail as long as every ID has a mapping.
	auto from = mappings[id];

	ZSTD_DCtx* dec = ZSTD_createDCtx();
	if (dec == NULL) {
	    throw "creating ZSTD decompression context";
	}

	return std::unique_ptr<Resource>(
	  new Resource(dec, from.content, from.compressed_length,
	               from.decompressed_length));
    };
}; // namespace res
"#;

/// `resource.hpp` — payload-container header (input-independent).
pub const RESOURCE_HDR: &str = r#"#ifndef RES_RESOURCE
#define RES_RESOURCE

#include "zstd.h"

namespace res {
    class Resource {
    public:
	// The default constructor is meaningless.  Every Resource must
	// be created with a reference to a static array with an
	// uncompressed length.
	Resource() = delete;

	// To construct a Resource, pass it an initialized ZSTD decoder
	// context, an array containing zstd compressed bytes, and the
	// size (in bytes) of the uncompressed resource.
	//
	// Most users should simply use Mapper::Fetch.
	Resource(ZSTD_DCtx*, const unsigned char*,
	         size_t compressed_length,
	         size_t decompressed_length) noexcept(true);
	~Resource() noexcept(true);

	// Len returns the full decompressed size of the asset.
	size_t Len() noexcept(true);

	// BlockSize returns the recommended size of a block which may
	// be written to by a single partial Read.
	const size_t BlockSize() noexcept(true);

	// Read ingests up to len bytes into the target buffer.  For the
	// best performance, the user should pass a buffer sized to the
	// full size of the resource, given by Len(), or to the block
	// size, given by BlockSize().  A smaller buffer may also be
	// used.
	//
	// Reset() may be called to begin from the beginning.
	const size_t Read(char* into, size_t len) noexcept(false);

	// Reset returns the state of the Resource to its initial state,
	// ready to begin filling a new target buffer.
	void Reset() noexcept(true);

    private:
	ZSTD_DCtx* decoder;
	size_t     consumed;

	const size_t         compressed_content_length;
	const size_t         decompressed_content_length;
	const unsigned char* content;
    };
}; // namespace res

#endif
"#;

/// `resource.cxx` — payload-container implementation (input-independent).
pub const RESOURCE_IMPL: &str = r#"#include "zstd.h"

#include "resource.hpp"

namespace res {
    size_t Resource::Len() noexcept(true) {
	return decompressed_content_length;
    }

    Resource::Resource(
      ZSTD_DCtx* decoder, const unsigned char* content,
      size_t compressed_content_length,
      size_t decompressed_content_length) noexcept(true)
        : decoder(decoder), consumed(0),
          compressed_content_length(compressed_content_length),
          decompressed_content_length(decompressed_content_length),
          content(content) {}

    Resource::~Resource() noexcept(true) {
	ZSTD_freeDCtx(decoder);
    }

    const size_t Resource::BlockSize() noexcept(true) {
	return ZSTD_DStreamOutSize();
    }

    const size_t Resource::Read(char*  into,
                                size_t len) noexcept(false) {
	ZSTD_inBuffer  src = { content, compressed_content_length,
                               consumed };
	ZSTD_outBuffer dst = { into, len, 0 };

	while (dst.pos < dst.size && src.pos < src.size) {
	    // Consume the next chunk into the destination.
	    auto more = ZSTD_decompressStream(decoder, &dst, &src);
	    if (ZSTD_isError(more)) {
		throw ZSTD_getErrorName(more);
	    }
	    if (more == 0) {
		// End of frame.
		break;
	    }
	}

	consumed = src.pos;
	return dst.pos;
    }

    void Resource::Reset() noexcept(true) {
	ZSTD_DCtx_reset(decoder, ZSTD_reset_session_only);

	consumed = 0;
    }
}; // namespace res
"#;

/// `.gitmodules` — module reference for the decompression dependency.
pub const GIT_MODULES: &str = r#"[submodule "zstd"]
	path = zstd
	url = https://github.com/facebook/zstd.git
"#;

/// `.gitignore` for the generated project.
pub const GIT_IGNORE: &str = r#"cmake_install.cmake
CMakeCache.txt
CMakeFiles/
build/*
!build/.gitkeep
lib/
!src/lib
target/

*.sw[nop]
*~
\#*
*#

*.so
*.a

*.opensdf
*.sdf
*.sln
*.suo
*.vcxproj
*.vcxproj.filters
Debug/
obj/
*.psess
*.vspx

.DS_Store
"#;

/// `.clang-format` for the generated project.
pub const CLANG_FORMAT: &str = r#"BasedOnStyle:                 LLVM
AlignConsecutiveAssignments:  true
AlignConsecutiveDeclarations: true
AccessModifierOffset:         -4
BinPackArguments:             true
BinPackParameters:            true
BreakStringLiterals:          true
ColumnLimit:                  72
ContinuationIndentWidth:      2
Cpp11BracedListStyle:         false
IndentCaseLabels:             false
IndentWidth:                  4
Language:                     Cpp
NamespaceIndentation:         All
PenaltyBreakAssignment:       100
PointerAlignment:             Left
ReflowComments:               true
SortIncludes:                 true
SpacesInContainerLiterals:    true
Standard:                     Auto
UseTab:                       ForIndentation
"#;

/// `id.hpp` brackets; one `\t<ident>, // <name>\n` line per resource.
pub const ID_HEAD: &str = r#"#ifndef RES_ID
#define RES_ID

namespace res {
    enum class ID {
"#;

pub const ID_TAIL: &str = r#"    };
};

#endif
"#;

/// `mappings.cxx` brackets; one table entry per resource.
pub const MAPPINGS_HEAD: &str = r#"#include "id.hpp"
#include "mapper.hpp"

namespace res {
    std::map<ID, const Mapper::resDefn> Mapper::mappings{
"#;

pub const MAPPINGS_TAIL: &str = r#"
    };
}; // namespace res
"#;

/// `mapper.hpp` brackets; one declaration pair per resource.
pub const MAPPER_HDR_HEAD: &str = r#"#ifndef RES_MAPPER
#define RES_MAPPER

#include <memory>
#include <map>

#include "id.hpp"
#include "resource.hpp"

namespace res {
    // Mapper encapsulates implementation details of the mapping of IDs
    // to Resources away from the user.
    //
    // Fetch is used to retrieve a new Resource, which can be used to
    // decompress a static asset.  It does not create a new copy of the
    // asset.
    class Mapper {
    public:
	// Mapper may not be instantiated.
	Mapper() = delete;

	// Fetch creates and retrieves a unique smart-pointer to a
	// Resource.
	static std::unique_ptr<Resource> Fetch(ID) noexcept(false);

    private:
	struct resDefn {
	    size_t               compressed_length;
	    size_t               decompressed_length;
	    const unsigned char* content;
	};

	static std::map<ID, const resDefn> mappings;

	// Here, all names of assets are defined.  Each must have an ID
	// associated with it.
"#;

pub const MAPPER_HDR_TAIL: &str = r#"
    };
}; // namespace res

#endif
"#;

/// `CMakeLists.txt` brackets; one `  res/<ident>_decl.cxx\n` line per
/// resource between them.
pub const CMAKE_HEAD: &str = r#"cmake_minimum_required(VERSION 3.1.0 FATAL_ERROR)
set(CMAKE_EXPORT_COMPILE_COMMANDS ON)

# Add zstd definitions.
add_subdirectory(zstd/build/cmake)

# Add Resource library.
add_library(Resource STATIC
  mapper.cxx
  mappings.cxx
  resource.cxx
"#;

pub const CMAKE_TAIL: &str = r#")

target_include_directories(Resource PUBLIC
  ${CMAKE_CURRENT_LIST_DIR}
  ${ZSTD_INCLUDE_DIR}
)
target_link_libraries(Resource libzstd_static)

set_property(TARGET Resource PROPERTY CXX_STANDARD 11)
set_property(TARGET Resource PROPERTY CXX_STANDARD_REQUIRED ON)
"#;
