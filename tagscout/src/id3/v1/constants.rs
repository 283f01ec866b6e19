//! ID3v1 genre table and helpers

/// The ID3v1 genre table, including the Winamp extensions (80..=191)
pub const GENRES: [&str; 192] = [
	"Blues",
	"Classic Rock",
	"Country",
	"Dance",
	"Disco",
	"Funk",
	"Grunge",
	"Hip-Hop",
	"Jazz",
	"Metal",
	"New Age",
	"Oldies",
	"Other",
	"Pop",
	"R&B",
	"Rap",
	"Reggae",
	"Rock",
	"Techno",
	"Industrial",
	"Alternative",
	"Ska",
	"Death Metal",
	"Pranks",
	"Soundtrack",
	"Euro-Techno",
	"Ambient",
	"Trip-Hop",
	"Vocal",
	"Jazz+Funk",
	"Fusion",
	"Trance",
	"Classical",
	"Instrumental",
	"Acid",
	"House",
	"Game",
	"Sound Clip",
	"Gospel",
	"Noise",
	"AlternRock",
	"Bass",
	"Soul",
	"Punk",
	"Space",
	"Meditative",
	"Instrumental Pop",
	"Instrumental Rock",
	"Ethnic",
	"Gothic",
	"Darkwave",
	"Techno-Industrial",
	"Electronic",
	"Pop-Folk",
	"Eurodance",
	"Dream",
	"Southern Rock",
	"Comedy",
	"Cult",
	"Gangsta",
	"Top 40",
	"Christian Rap",
	"Pop/Funk",
	"Jungle",
	"Native American",
	"Cabaret",
	"New Wave",
	"Psychadelic",
	"Rave",
	"Showtunes",
	"Trailer",
	"Lo-Fi",
	"Tribal",
	"Acid Punk",
	"Acid Jazz",
	"Polka",
	"Retro",
	"Musical",
	"Rock & Roll",
	"Hard Rock",
	"Folk",
	"Folk-Rock",
	"National Folk",
	"Swing",
	"Fast Fusion",
	"Bebob",
	"Latin",
	"Revival",
	"Celtic",
	"Bluegrass",
	"Avantgarde",
	"Gothic Rock",
	"Progressive Rock",
	"Psychedelic Rock",
	"Symphonic Rock",
	"Slow Rock",
	"Big Band",
	"Chorus",
	"Easy Listening",
	"Acoustic",
	"Humour",
	"Speech",
	"Chanson",
	"Opera",
	"Chamber Music",
	"Sonata",
	"Symphony",
	"Booty Bass",
	"Primus",
	"Porn Groove",
	"Satire",
	"Slow Jam",
	"Club",
	"Tango",
	"Samba",
	"Folklore",
	"Ballad",
	"Power Ballad",
	"Rhythmic Soul",
	"Freestyle",
	"Duet",
	"Punk Rock",
	"Drum Solo",
	"A capella",
	"Euro-House",
	"Dance Hall",
	"Goa",
	"Drum & Bass",
	"Club-House",
	"Hardcore",
	"Terror",
	"Indie",
	"BritPop",
	"Negerpunk",
	"Polsk Punk",
	"Beat",
	"Christian Gangsta Rap",
	"Heavy Metal",
	"Black Metal",
	"Crossover",
	"Contemporary Christian",
	"Christian Rock",
	"Merengue",
	"Salsa",
	"Thrash Metal",
	"Anime",
	"JPop",
	"Synthpop",
	"Abstract",
	"Art Rock",
	"Baroque",
	"Bhangra",
	"Big Beat",
	"Breakbeat",
	"Chillout",
	"Downtempo",
	"Dub",
	"EBM",
	"Eclectic",
	"Electro",
	"Electroclash",
	"Emo",
	"Experimental",
	"Garage",
	"Global",
	"IDM",
	"Illbient",
	"Industro-Goth",
	"Jam Band",
	"Krautrock",
	"Leftfield",
	"Lounge",
	"Math Rock",
	"New Romantic",
	"Nu-Breakz",
	"Post-Punk",
	"Post-Rock",
	"Psytrance",
	"Shoegaze",
	"Space Rock",
	"Trop Rock",
	"World Music",
	"Neoclassical",
	"Audiobook",
	"Audio Theatre",
	"Neue Deutsche Welle",
	"Podcast",
	"Indie Rock",
	"G-Funk",
	"Dubstep",
	"Garage Rock",
	"Psybient",
];

pub(crate) const ID3V1_TAG_MARKER: [u8; 3] = *b"TAG";

/// Look up a genre by its ID3v1 index
pub fn genre_name(index: usize) -> Option<&'static str> {
	GENRES.get(index).copied()
}

/// Resolve numeric genre references against [`GENRES`]
///
/// Handles the forms found in the wild:
///
/// * A bare index, as written by ID3v2.4 taggers (`"17"`)
/// * ID3v2.3 references, optionally followed by a refinement (`"(17)"`, `"(4)Eurodisco"`, `"(51)(39)"`)
/// * The `RX` (Remix) and `CR` (Cover) keywords
/// * An escaped opening parenthesis (`"((Live)"`)
///
/// Multiple values separated by `"; "` are resolved individually. Anything else is returned as is.
pub fn resolve_genre(text: &str) -> String {
	text.split("; ")
		.map(resolve_single_genre)
		.collect::<Vec<_>>()
		.join("; ")
}

fn resolve_single_genre(text: &str) -> String {
	let trimmed = text.trim();

	if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
		return match trimmed.parse::<usize>().ok().and_then(genre_name) {
			Some(name) => name.to_string(),
			None => text.to_string(),
		};
	}

	let mut names = Vec::new();
	let mut rest = trimmed;
	while let Some(inner) = rest.strip_prefix('(') {
		// "((" escapes a literal parenthesis
		if inner.starts_with('(') {
			rest = inner;
			break;
		}

		let Some((reference, after)) = inner.split_once(')') else {
			break;
		};

		let name = match reference {
			"RX" => Some("Remix"),
			"CR" => Some("Cover"),
			_ if !reference.is_empty() && reference.bytes().all(|b| b.is_ascii_digit()) => {
				reference.parse::<usize>().ok().and_then(genre_name)
			},
			_ => None,
		};

		let Some(name) = name else {
			break;
		};

		names.push(name);
		rest = after;
	}

	if !rest.is_empty() {
		return rest.to_string();
	}

	if names.is_empty() {
		return text.to_string();
	}

	names.join("; ")
}
