//! Element symbols and the nuclide naming conventions of the archive.
//!
//! Archive names are `<A><Symbol>` for ground states (`135Xe`) and
//! `<A><Symbol>_<k>m` for metastable states (`135Xe_1m`).

pub const MAX_ATOMIC_NUMBER: usize = 118;

pub const ENSDF_EXTENSION: &str = ".ensdf";

const ELEMENT_SYMBOLS: [&str; MAX_ATOMIC_NUMBER] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

pub fn element_symbol(atomic_number: usize) -> Option<&'static str> {
    if atomic_number == 0 || atomic_number > MAX_ATOMIC_NUMBER {
        None
    } else {
        Some(ELEMENT_SYMBOLS[atomic_number - 1])
    }
}

pub fn atomic_number_for_symbol(symbol: &str) -> Option<usize> {
    let normalized = symbol.trim();
    if normalized.is_empty() {
        return None;
    }

    ELEMENT_SYMBOLS
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(normalized))
        .map(|index| index + 1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NuclideId {
    pub mass_number: u32,
    pub atomic_number: u32,
    pub metastable: u32,
}

impl NuclideId {
    pub fn new(atomic_number: u32, mass_number: u32, metastable: u32) -> Self {
        Self {
            mass_number,
            atomic_number,
            metastable,
        }
    }

    pub fn neutron_number(&self) -> u32 {
        self.mass_number.saturating_sub(self.atomic_number)
    }

    pub fn symbol(&self) -> Option<&'static str> {
        element_symbol(self.atomic_number as usize)
    }

    /// Archive name, e.g. `135Xe` or `135Xe_1m`.
    pub fn archive_name(&self) -> Option<String> {
        let symbol = self.symbol()?;
        Some(if self.metastable == 0 {
            format!("{}{}", self.mass_number, symbol)
        } else {
            format!("{}{}_{}m", self.mass_number, symbol, self.metastable)
        })
    }

    /// Parse an archive name back into its components.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        let (base, metastable) = match name.split_once('_') {
            Some((base, suffix)) => {
                let index = suffix.strip_suffix(['m', 'M'])?.parse::<u32>().ok()?;
                (base, index)
            }
            None => (name, 0),
        };

        let split = base.find(|c: char| !c.is_ascii_digit())?;
        let mass_number = base[..split].parse::<u32>().ok()?;
        let atomic_number = atomic_number_for_symbol(&base[split..])? as u32;
        Some(Self::new(atomic_number, mass_number, metastable))
    }
}

/// Name of the ENSDF file holding the levels of `archive_name`: the metastable suffix is
/// dropped and the base name upper-cased (`135Xe_1m` -> `135XE.ensdf`).
pub fn ensdf_file_name(archive_name: &str) -> String {
    let base = archive_name
        .split_once('_')
        .map(|(base, _)| base)
        .unwrap_or(archive_name);
    format!("{}{}", base.to_ascii_uppercase(), ENSDF_EXTENSION)
}
